//! sdrlink-core: Core traits, types, and error definitions for sdrlink.
//!
//! This crate defines the transport-agnostic abstractions the sdrlink
//! protocol client is built on. Applications and test suites depend on
//! these types without pulling in any socket code.
//!
//! # Key types
//!
//! - [`ControlLink`] / [`DataLink`] -- the two channel capabilities
//! - [`DeviceEvent`] -- asynchronous session notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod link;

// Re-export key types at crate root for ergonomic `use sdrlink_core::*`.
pub use error::{Error, Result};
pub use events::DeviceEvent;
pub use link::{ControlLink, DataLink};
