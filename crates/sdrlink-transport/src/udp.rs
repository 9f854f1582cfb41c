//! UDP data link for streamed IQ sample reception.
//!
//! This module provides [`UdpDataLink`], which implements the
//! [`DataLink`] trait over a UDP socket bound to a fixed local port. Each
//! received datagram is one self-contained unit of streamed payload -- no
//! inter-datagram reassembly is performed, and payloads are forwarded
//! verbatim to the sink.
//!
//! Equality and hashing are defined over the configured local endpoint
//! (host + port), a value identity over configuration used for map keys
//! and log correlation, never for ownership.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sdrlink_core::link::DataLink;

/// Receive buffer size for one datagram.
///
/// Sample-data datagrams on a real network stay under the Ethernet MTU;
/// 8192 bytes leaves headroom for jumbo-frame configurations.
const DATAGRAM_BUF_SIZE: usize = 8192;

/// UDP data link bound to a fixed local port.
///
/// Inbound datagrams are forwarded into the `mpsc` sink passed to
/// [`new`](UdpDataLink::new); the receiving end belongs to the protocol
/// client.
#[derive(Debug)]
pub struct UdpDataLink {
    /// Local interface address to bind (e.g. `"0.0.0.0"`).
    host: String,
    /// Local port the receiver streams to.
    port: u16,
    /// Sink for datagram payloads, one send per datagram.
    sink: mpsc::Sender<Vec<u8>>,
    /// The running listen loop, `None` while stopped.
    session: Mutex<Option<ListenSession>>,
}

/// Token and task handle for one listening session, stored together so
/// start/stop never observe one without the other.
#[derive(Debug)]
struct ListenSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl UdpDataLink {
    /// Create a link that will listen on the given local host and port.
    ///
    /// No socket is bound until [`start_listening`](DataLink::start_listening)
    /// is called.
    pub fn new(host: &str, port: u16, sink: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            host: host.to_string(),
            port,
            sink,
            session: Mutex::new(None),
        }
    }

    /// The local port this link is configured to listen on.
    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl DataLink for UdpDataLink {
    async fn start_listening(&self) {
        let mut session = self.session.lock().await;
        if session.is_some() {
            tracing::debug!(port = self.port, "listen requested while already listening");
            return;
        }

        let bind_addr = format!("{}:{}", self.host, self.port);
        let socket = match UdpSocket::bind(&bind_addr).await {
            Ok(socket) => socket,
            Err(e) => {
                // Bind failures (port taken) are contained: the start call
                // completes and the link simply never delivers data.
                tracing::warn!(addr = %bind_addr, error = %e, "data socket bind failed");
                return;
            }
        };

        tracing::debug!(addr = %bind_addr, "data socket bound");

        let cancel = CancellationToken::new();
        let task = tokio::spawn(listen_loop(
            socket,
            self.sink.clone(),
            cancel.clone(),
            self.port,
        ));

        *session = Some(ListenSession { cancel, task });
    }

    async fn stop_listening(&self) {
        let session = self.session.lock().await.take();
        match session {
            Some(session) => {
                session.cancel.cancel();
                // Await the loop so its completion -- and the socket
                // release -- is observable to the caller.
                let _ = session.task.await;
                tracing::debug!(port = self.port, "data listener stopped");
            }
            None => {
                tracing::debug!(port = self.port, "stop requested while not listening");
            }
        }
    }
}

impl PartialEq for UdpDataLink {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for UdpDataLink {}

impl Hash for UdpDataLink {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

/// Background listen loop: one task per listening session, lifetime bound
/// to start/stop.
///
/// Each datagram's full payload is forwarded verbatim. Per-datagram
/// receive errors are non-fatal; the loop keeps waiting. The loop-stopped
/// diagnostic is emitted on every exit path.
async fn listen_loop(
    socket: UdpSocket,
    sink: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
    port: u16,
) {
    let mut buf = [0u8; DATAGRAM_BUF_SIZE];

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::debug!(port = port, "listen loop cancelled");
                break;
            }

            result = socket.recv_from(&mut buf) => match result {
                Ok((n, src)) => {
                    tracing::trace!(port = port, remote = %src, bytes = n, "datagram received");
                    if sink.send(buf[..n].to_vec()).await.is_err() {
                        tracing::debug!(port = port, "datagram sink closed, ending listen loop");
                        break;
                    }
                }
                Err(e) => {
                    // Non-fatal for UDP; keep listening.
                    tracing::trace!(port = port, error = %e, "datagram recv error");
                }
            }
        }
    }

    tracing::debug!(port = port, "data listen loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::time::Duration;

    /// Helper: find a free local UDP port by binding to 0 and dropping.
    async fn free_port() -> u16 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.local_addr().unwrap().port()
    }

    fn test_sink() -> (mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
        mpsc::channel(64)
    }

    fn hash_of(link: &UdpDataLink) -> u64 {
        let mut hasher = DefaultHasher::new();
        link.hash(&mut hasher);
        hasher.finish()
    }

    #[tokio::test]
    async fn datagram_delivered_verbatim() {
        let port = free_port().await;
        let (tx, mut rx) = test_sink();
        let link = UdpDataLink::new("127.0.0.1", port, tx);

        link.start_listening().await;

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let payload: Vec<u8> = (0..64).map(|i| i as u8).collect();
        sender
            .send_to(&payload, ("127.0.0.1", port))
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for datagram")
            .expect("sink closed unexpectedly");
        assert_eq!(received, payload);

        link.stop_listening().await;
    }

    #[tokio::test]
    async fn datagrams_delivered_in_order() {
        let port = free_port().await;
        let (tx, mut rx) = test_sink();
        let link = UdpDataLink::new("127.0.0.1", port, tx);

        link.start_listening().await;

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        for i in 0..3u8 {
            sender.send_to(&[i; 8], ("127.0.0.1", port)).await.unwrap();
        }

        for i in 0..3u8 {
            let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out waiting for datagram")
                .expect("sink closed unexpectedly");
            assert_eq!(received, vec![i; 8]);
        }

        link.stop_listening().await;
    }

    #[tokio::test]
    async fn stop_listening_releases_the_port() {
        let port = free_port().await;
        let (tx, _rx) = test_sink();
        let link = UdpDataLink::new("127.0.0.1", port, tx);

        link.start_listening().await;
        link.stop_listening().await;

        // stop_listening awaited the loop, so the socket is released and
        // the port can be re-bound immediately.
        let rebound = UdpSocket::bind(("127.0.0.1", port)).await;
        assert!(rebound.is_ok(), "port still held after stop_listening");
    }

    #[tokio::test]
    async fn stop_without_start_is_noop() {
        let (tx, _rx) = test_sink();
        let link = UdpDataLink::new("127.0.0.1", 1, tx);

        link.stop_listening().await;
        link.stop_listening().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_contained() {
        let holder = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = holder.local_addr().unwrap().port();

        let (tx, mut rx) = test_sink();
        let link = UdpDataLink::new("127.0.0.1", port, tx);

        // The port is taken; start must complete without error and the
        // link must simply never deliver.
        link.start_listening().await;

        let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(result.is_err(), "no data should arrive after a failed bind");

        link.stop_listening().await;
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let port = free_port().await;
        let (tx, mut rx) = test_sink();
        let link = UdpDataLink::new("127.0.0.1", port, tx);

        link.start_listening().await;
        link.start_listening().await;

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&[0x55; 4], ("127.0.0.1", port)).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for datagram")
            .expect("sink closed unexpectedly");
        assert_eq!(received, vec![0x55; 4]);

        link.stop_listening().await;
    }

    #[tokio::test]
    async fn equality_is_over_endpoint() {
        let (tx_a, _rx_a) = test_sink();
        let (tx_b, _rx_b) = test_sink();
        let (tx_c, _rx_c) = test_sink();

        let a = UdpDataLink::new("0.0.0.0", 60_000, tx_a);
        let b = UdpDataLink::new("0.0.0.0", 60_000, tx_b);
        let c = UdpDataLink::new("0.0.0.0", 60_001, tx_c);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn hash_is_stable_over_endpoint() {
        let (tx_a, _rx_a) = test_sink();
        let (tx_b, _rx_b) = test_sink();

        let a = UdpDataLink::new("0.0.0.0", 60_000, tx_a);
        let b = UdpDataLink::new("0.0.0.0", 60_000, tx_b);

        assert_eq!(hash_of(&a), hash_of(&b));
        // Stable across calls.
        assert_eq!(hash_of(&a), hash_of(&a));

        // No collisions across a contiguous port range.
        let mut hashes = std::collections::HashSet::new();
        for port in 50_000..50_032u16 {
            let (tx, _rx) = test_sink();
            let link = UdpDataLink::new("0.0.0.0", port, tx);
            assert!(hashes.insert(hash_of(&link)), "hash collision at port {}", port);
        }
    }
}
