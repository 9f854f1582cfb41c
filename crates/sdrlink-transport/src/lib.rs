//! Transport implementations for sdrlink.
//!
//! This crate provides the concrete implementations of the
//! [`ControlLink`](sdrlink_core::ControlLink) and
//! [`DataLink`](sdrlink_core::DataLink) traits from `sdrlink-core`:
//!
//! - [`TcpControlLink`]: the connection-oriented command channel
//!   (command/response pairs plus unsolicited notifications)
//! - [`UdpDataLink`]: the connectionless channel carrying streamed IQ
//!   sample datagrams
//!
//! Both links run a cancellable receive loop while active and forward
//! inbound bytes into an `mpsc` sink owned by the protocol client.
//! Neither link interprets payload structure; framing happens above this
//! layer.

pub mod tcp;
pub mod udp;

pub use tcp::TcpControlLink;
pub use udp::UdpDataLink;
