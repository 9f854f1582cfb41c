//! End-to-end session tests against a scripted receiver on localhost.
//!
//! These exercise the real TCP and UDP links underneath the protocol
//! client: the scripted peer acks every control frame by echoing it, the
//! way the receiver acknowledges set commands.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc;

use sdrlink::{Channel, DeviceEvent, ReceiverClient, TcpControlLink, UdpDataLink};

/// Read one length-prefixed frame off the control stream.
async fn read_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).await.unwrap();
    let total = (u16::from_le_bytes(header) & 0x1FFF) as usize;

    let mut frame = vec![0u8; total];
    frame[..2].copy_from_slice(&header);
    stream.read_exact(&mut frame[2..]).await.unwrap();
    frame
}

/// Scripted receiver: accept one client and echo `count` control frames.
async fn echo_peer(listener: TcpListener, count: usize) -> TcpStream {
    let (mut stream, _) = listener.accept().await.unwrap();
    for _ in 0..count {
        let frame = read_frame(&mut stream).await;
        stream.write_all(&frame).await.unwrap();
        stream.flush().await.unwrap();
    }
    stream
}

async fn free_udp_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap().port()
}

struct Session {
    client: ReceiverClient,
    data_port: u16,
}

async fn session(listener_port: u16, data_port: u16) -> Session {
    let (control_tx, control_rx) = mpsc::channel(64);
    let (data_tx, data_rx) = mpsc::channel(64);

    let control = Arc::new(TcpControlLink::new("127.0.0.1", listener_port, control_tx));
    let data = Arc::new(UdpDataLink::new("127.0.0.1", data_port, data_tx));
    let client = ReceiverClient::new(control, data, control_rx, data_rx);

    Session { client, data_port }
}

#[tokio::test]
async fn full_session_lifecycle() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener_port = listener.local_addr().unwrap().port();
    let data_port = free_udp_port().await;

    // Three init commands plus one frequency command.
    let peer = tokio::spawn(async move {
        let stream = echo_peer(listener, 4).await;
        // Hold the connection open while the client streams.
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(stream);
    });

    let s = session(listener_port, data_port).await;

    s.client.connect().await.unwrap();
    assert!(s.client.connected());

    s.client
        .change_frequency(7_074_000, Channel::A)
        .await
        .unwrap();

    // Start streaming and feed a datagram to the data port.
    s.client.start_iq().await;
    assert!(s.client.iq_started());

    let mut events = s.client.subscribe();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let samples: Vec<u8> = (0..128).map(|i| i as u8).collect();
    sender
        .send_to(&samples, ("127.0.0.1", s.data_port))
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for IQ data")
        .unwrap();
    match event {
        DeviceEvent::IqData(payload) => assert_eq!(payload, samples),
        other => panic!("expected IqData, got {:?}", other),
    }

    s.client.stop_iq().await;
    assert!(!s.client.iq_started());

    s.client.disconnect().await;
    assert!(!s.client.connected());

    peer.abort();
}

#[tokio::test]
async fn connect_to_dead_port_fails_quietly() {
    // Bind and drop a listener so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener_port = listener.local_addr().unwrap().port();
    drop(listener);
    let data_port = free_udp_port().await;

    let s = session(listener_port, data_port).await;

    // The connect attempt is contained; the init sequence then reports
    // the invalid state.
    let result = s.client.connect().await;
    assert!(result.is_err());
    assert!(!s.client.connected());

    // Streaming start stays a no-op on the dead session.
    s.client.start_iq().await;
    assert!(!s.client.iq_started());
}

#[tokio::test]
async fn unsolicited_notification_reaches_subscribers() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener_port = listener.local_addr().unwrap().port();
    let data_port = free_udp_port().await;

    let peer = tokio::spawn(async move {
        let mut stream = echo_peer(listener, 3).await;

        // Push a status frame with no request in flight.
        let status = sdrlink::framer::cmd_receiver_state(true);
        stream.write_all(&status).await.unwrap();
        stream.flush().await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(stream);
    });

    let s = session(listener_port, data_port).await;

    // Subscribe before connecting so the notification cannot slip past.
    let mut events = s.client.subscribe();
    s.client.connect().await.unwrap();

    // Skip session events (Connected) until the notification arrives.
    let payload = loop {
        let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("timed out waiting for unsolicited event")
            .unwrap();
        if let DeviceEvent::Unsolicited(payload) = event {
            break payload;
        }
    };
    assert_eq!(payload, sdrlink::framer::cmd_receiver_state(true));

    s.client.disconnect().await;
    peer.abort();
}
