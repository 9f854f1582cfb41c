//! Capability traits for the two receiver channels.
//!
//! [`ControlLink`] abstracts the connection-oriented command channel and
//! [`DataLink`] the connectionless sample-data channel. The protocol
//! client operates on these traits rather than on concrete sockets,
//! enabling both real network control and deterministic unit testing with
//! in-memory doubles.
//!
//! Inbound delivery is deliberately NOT part of either trait: each
//! concrete link is constructed with an `mpsc::Sender<Vec<u8>>` sink that
//! the client owns the receiving end of. The single-consumer channel makes
//! "exactly one dispatcher sees every payload" an explicit contract, which
//! the request/response correlation in the client depends on.

use async_trait::async_trait;

use crate::error::Result;

/// Asynchronous control channel to a receiver.
///
/// The link owns exactly one stream connection at a time and runs its own
/// receive loop while connected. State transitions are
/// `Disconnected -> Connected -> Disconnected`, driven by
/// [`connect`](ControlLink::connect) / [`disconnect`](ControlLink::disconnect)
/// and by internal failure detection (a failed read marks the link
/// disconnected and ends the receive loop).
#[async_trait]
pub trait ControlLink: Send + Sync {
    /// Attempt to open the control connection.
    ///
    /// Best-effort by contract: connection failures (bad host, refused,
    /// timeout) are contained inside the link and never surface here.
    /// Callers must check [`is_connected`](ControlLink::is_connected)
    /// afterward. Calling `connect` while already connected is a no-op.
    async fn connect(&self);

    /// Close the connection and stop the receive loop.
    ///
    /// Idempotent: calling this while already disconnected only emits a
    /// diagnostic.
    async fn disconnect(&self);

    /// Whether the control connection is currently established.
    fn is_connected(&self) -> bool;

    /// Send raw bytes on the control stream.
    ///
    /// Bytes reach the peer in submission order; there is no internal
    /// queuing or batching. Returns
    /// [`Error::NotConnected`](crate::error::Error::NotConnected) when the
    /// link is not connected.
    async fn send(&self, data: &[u8]) -> Result<()>;

    /// Send a text command, encoded as UTF-8 bytes.
    async fn send_text(&self, text: &str) -> Result<()> {
        self.send(text.as_bytes()).await
    }
}

/// Asynchronous datagram channel for streamed sample data.
#[async_trait]
pub trait DataLink: Send + Sync {
    /// Bind the receive socket and start the listen loop.
    ///
    /// A bind failure (port already taken) is contained inside the link:
    /// the call still completes and the link simply never delivers data.
    async fn start_listening(&self);

    /// Stop the listen loop and release the socket.
    ///
    /// Awaits the loop's termination so that start/stop is safely
    /// sequential. Calling this when never started is a no-op.
    async fn stop_listening(&self);
}
