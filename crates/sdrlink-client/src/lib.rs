//! sdrlink-client: Binary framing and protocol orchestration for sdrlink.
//!
//! This crate implements the device-control protocol spoken by the
//! receiver over its two channels:
//!
//! - **Framer** ([`framer`]) -- pure build/parse between structured
//!   commands and length-prefixed binary wire frames. No state, no I/O.
//! - **Protocol client** ([`client`]) -- the [`ReceiverClient`] session
//!   layer: initialization handshake, single-in-flight request/response
//!   correlation, unsolicited message routing, and IQ streaming control.
//!
//! # Architecture
//!
//! The receiver uses a split transport:
//! - **TCP** for framed commands, correlated responses, and unsolicited
//!   status notifications
//! - **UDP** for the streamed IQ sample datagrams
//!
//! [`ReceiverClient`] composes one [`ControlLink`](sdrlink_core::ControlLink)
//! and one [`DataLink`](sdrlink_core::DataLink) -- injected as trait
//! objects, so tests substitute scripted doubles for the real sockets.

pub mod client;
pub mod framer;

pub use client::{ClientOptions, DEFAULT_SAMPLE_RATE, ReceiverClient};
pub use framer::{Channel, MessageKind};
