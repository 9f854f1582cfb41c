//! Asynchronous device event types.
//!
//! Events are emitted by the protocol client through a
//! `tokio::sync::broadcast` channel when the session state changes or
//! when traffic arrives that no caller is explicitly awaiting. Consumers
//! subscribe for real-time updates without polling.

/// An event emitted by the protocol client.
///
/// Events are delivered on a best-effort basis through a bounded broadcast
/// channel; slow consumers may miss events under heavy load (e.g. a fast
/// IQ stream with a stalled subscriber).
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// The control-channel session was established and initialized.
    Connected,

    /// The control-channel session was torn down.
    Disconnected,

    /// A control-channel payload arrived with no request in flight.
    ///
    /// The payload is raw wire bytes; framing happens in the consumer,
    /// not the transport.
    Unsolicited(Vec<u8>),

    /// One datagram of streamed IQ sample data.
    IqData(Vec<u8>),
}
