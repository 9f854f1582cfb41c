//! sdrlink: Async client for networked SDR receivers.
//!
//! A receiver of this family speaks a binary device-control protocol over
//! two channels: a TCP control channel carrying framed command/response
//! pairs plus unsolicited status notifications, and a UDP data channel
//! carrying streamed IQ sample datagrams once streaming is started.
//!
//! This facade crate re-exports the public surface of the workspace:
//!
//! - [`ReceiverClient`] -- the protocol session layer
//! - [`TcpControlLink`] / [`UdpDataLink`] -- the concrete channel links
//! - [`ControlLink`] / [`DataLink`] -- the capability traits the client
//!   is injected with
//! - [`DeviceEvent`] -- session and traffic notifications
//! - [`framer`] -- wire frame building and parsing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use sdrlink::{Channel, ReceiverClient, TcpControlLink, UdpDataLink};
//!
//! # async fn example() -> sdrlink::Result<()> {
//! let (control_tx, control_rx) = mpsc::channel(64);
//! let (data_tx, data_rx) = mpsc::channel(64);
//!
//! let control = Arc::new(TcpControlLink::new("192.168.1.100", 50000, control_tx));
//! let data = Arc::new(UdpDataLink::new("0.0.0.0", 50000, data_tx));
//! let client = ReceiverClient::new(control, data, control_rx, data_rx);
//!
//! client.connect().await?;
//! client.change_frequency(14_250_000, Channel::A).await?;
//! client.start_iq().await;
//! # Ok(())
//! # }
//! ```

pub use sdrlink_core::{ControlLink, DataLink, DeviceEvent, Error, Result};
pub use sdrlink_transport::{TcpControlLink, UdpDataLink};

pub use sdrlink_client::framer;
pub use sdrlink_client::{Channel, ClientOptions, DEFAULT_SAMPLE_RATE, MessageKind, ReceiverClient};
