//! Error types for sdrlink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, framing-layer, and
//! protocol-sequencing errors are all captured here.

/// The error type for all sdrlink operations.
///
/// Variants fall into three groups with different propagation rules:
/// caller misuse ([`NotConnected`](Error::NotConnected),
/// [`RequestPending`](Error::RequestPending),
/// [`InvalidParameter`](Error::InvalidParameter)) is reported
/// synchronously; environmental faults ([`Transport`](Error::Transport),
/// [`ConnectionLost`](Error::ConnectionLost), [`Timeout`](Error::Timeout),
/// [`Io`](Error::Io)) are absorbed at the transport boundary wherever the
/// contract calls for it; [`Framing`](Error::Framing) surfaces only when a
/// payload is actually parsed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (TCP socket, UDP socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// A malformed or truncated wire frame.
    #[error("framing error: {0}")]
    Framing(String),

    /// Timed out waiting for a response from the receiver.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a command builder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the receiver has been established.
    #[error("not connected")]
    NotConnected,

    /// A control request is already in flight.
    ///
    /// The protocol is strictly one-outstanding-request; a second request
    /// is rejected rather than queued or overwritten.
    #[error("a control request is already in flight")]
    RequestPending,

    /// The connection to the receiver was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("connection refused".into());
        assert_eq!(e.to_string(), "transport error: connection refused");
    }

    #[test]
    fn error_display_framing() {
        let e = Error::Framing("frame shorter than header".into());
        assert_eq!(e.to_string(), "framing error: frame shorter than header");
    }

    #[test]
    fn error_display_timeout() {
        let e = Error::Timeout;
        assert_eq!(e.to_string(), "timeout waiting for response");
    }

    #[test]
    fn error_display_invalid_parameter() {
        let e = Error::InvalidParameter("frequency out of range".into());
        assert_eq!(e.to_string(), "invalid parameter: frequency out of range");
    }

    #[test]
    fn error_display_not_connected() {
        let e = Error::NotConnected;
        assert_eq!(e.to_string(), "not connected");
    }

    #[test]
    fn error_display_request_pending() {
        let e = Error::RequestPending;
        assert_eq!(e.to_string(), "a control request is already in flight");
    }

    #[test]
    fn error_display_connection_lost() {
        let e = Error::ConnectionLost;
        assert_eq!(e.to_string(), "connection lost");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        // io::Error is Send + Sync, so our Error should be too.
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<u32> = Ok(42);
        match ok {
            Ok(val) => assert_eq!(val, 42),
            Err(_) => panic!("expected Ok"),
        }

        let err: Result<u32> = Err(Error::Timeout);
        assert!(err.is_err());
    }
}
