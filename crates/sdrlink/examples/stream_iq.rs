//! Connect to a receiver, tune it, and monitor the IQ stream.
//!
//! Demonstrates the full session lifecycle: connect and initialize,
//! change frequency, start IQ streaming, drain events for a while, then
//! stop and disconnect.
//!
//! # Requirements
//!
//! - A receiver reachable on the LAN (adjust the address below)
//! - The local UDP data port free
//!
//! # Usage
//!
//! ```sh
//! cargo run -p sdrlink --example stream_iq
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use sdrlink::{Channel, DeviceEvent, ReceiverClient, TcpControlLink, UdpDataLink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let host = "192.168.1.100";
    let control_port = 50_000;
    let data_port = 50_000;

    let (control_tx, control_rx) = mpsc::channel(64);
    let (data_tx, data_rx) = mpsc::channel(256);

    let control = Arc::new(TcpControlLink::new(host, control_port, control_tx));
    let data = Arc::new(UdpDataLink::new("0.0.0.0", data_port, data_tx));
    let client = ReceiverClient::new(control, data, control_rx, data_rx);

    println!("Connecting to receiver at {}:{}...", host, control_port);
    client.connect().await?;
    println!("Connected and initialized.\n");

    client.change_frequency(14_250_000, Channel::A).await?;
    println!("Tuned to 14.250 MHz.");

    client.start_iq().await;
    println!("IQ streaming started on UDP port {}.\n", data_port);

    // Drain events for 10 seconds.
    let mut events = client.subscribe();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut datagrams = 0usize;
    let mut bytes = 0usize;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }

        match tokio::time::timeout(remaining, events.recv()).await {
            Ok(Ok(DeviceEvent::IqData(payload))) => {
                datagrams += 1;
                bytes += payload.len();
            }
            Ok(Ok(DeviceEvent::Unsolicited(payload))) => {
                println!("Unsolicited message: {} bytes", payload.len());
            }
            Ok(Ok(DeviceEvent::Disconnected)) => {
                println!("Receiver disconnected.");
                break;
            }
            Ok(Ok(_)) => {}
            Ok(Err(tokio::sync::broadcast::error::RecvError::Lagged(n))) => {
                println!("(missed {} events due to lag)", n);
            }
            Ok(Err(tokio::sync::broadcast::error::RecvError::Closed)) => break,
            Err(_) => break,
        }
    }

    println!("\nReceived {} datagrams, {} bytes total.", datagrams, bytes);

    client.stop_iq().await;
    client.disconnect().await;
    println!("Session closed.");
    Ok(())
}
