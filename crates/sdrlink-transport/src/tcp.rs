//! TCP control link for receiver communication.
//!
//! This module provides [`TcpControlLink`], which implements the
//! [`ControlLink`] trait over a single TCP connection to the receiver's
//! command port.
//!
//! The connect contract is deliberately best-effort: `connect()` never
//! reports a failure to the caller. Connection problems are logged and
//! leave the link observably disconnected, so a long-lived session layer
//! can poll [`is_connected`](ControlLink::is_connected) and decide when to
//! retry without wrapping every attempt in error handling.
//!
//! While connected, a background receive loop forwards every successful
//! read -- raw bytes, not frames -- into the payload sink supplied at
//! construction. Splitting inbound traffic into protocol frames is the
//! consumer's job.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use sdrlink_core::error::{Error, Result};
use sdrlink_core::link::ControlLink;

/// Default connection timeout (5 seconds).
///
/// Generous enough for LAN receivers and most remote links, but short
/// enough that a wrong address does not hang the session layer.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read buffer size for the receive loop.
///
/// Control traffic is small; 4096 bytes comfortably holds any burst of
/// responses and notifications between reads.
const READ_BUF_SIZE: usize = 4096;

/// TCP control link to a receiver.
///
/// Owns at most one TCP connection at a time. Inbound payloads are
/// forwarded into the `mpsc` sink passed to [`new`](TcpControlLink::new);
/// the receiving end belongs to the protocol client.
pub struct TcpControlLink {
    /// The `host:port` address of the receiver's command port.
    addr: String,
    /// Sink for raw inbound payloads, one send per successful read.
    sink: mpsc::Sender<Vec<u8>>,
    /// Connection state flag (atomic for lock-free reads).
    connected: Arc<AtomicBool>,
    /// Write half of the TCP stream, `None` while disconnected.
    writer: Mutex<Option<WriteHalf<TcpStream>>>,
    /// The running receive loop, `None` while disconnected.
    reader: Mutex<Option<ReaderTask>>,
}

/// Token and task handle for one receive loop, stored together so
/// connect/disconnect never observe one without the other.
#[derive(Debug)]
struct ReaderTask {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TcpControlLink {
    /// Create a link for the given receiver address.
    ///
    /// No connection is attempted until [`connect`](ControlLink::connect)
    /// is called. `sink` receives every inbound payload while connected.
    pub fn new(host: &str, port: u16, sink: mpsc::Sender<Vec<u8>>) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
            sink,
            connected: Arc::new(AtomicBool::new(false)),
            writer: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    /// Get the address string this link is configured for.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl std::fmt::Debug for TcpControlLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpControlLink")
            .field("addr", &self.addr)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[async_trait]
impl ControlLink for TcpControlLink {
    async fn connect(&self) {
        if self.connected.load(Ordering::SeqCst) {
            tracing::debug!(addr = %self.addr, "connect requested while already connected");
            return;
        }

        tracing::debug!(addr = %self.addr, "connecting to control port");

        let stream = match tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.addr))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::warn!(addr = %self.addr, error = %e, "control connect failed");
                return;
            }
            Err(_) => {
                tracing::warn!(addr = %self.addr, "control connect timed out");
                return;
            }
        };

        // Disable Nagle's algorithm; commands are small and latency-sensitive.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(addr = %self.addr, error = %e, "failed to set TCP_NODELAY");
        }

        let (read_half, write_half) = tokio::io::split(stream);

        *self.writer.lock().await = Some(write_half);
        self.connected.store(true, Ordering::SeqCst);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(receive_loop(
            read_half,
            self.sink.clone(),
            Arc::clone(&self.connected),
            cancel.clone(),
            self.addr.clone(),
        ));

        *self.reader.lock().await = Some(ReaderTask { cancel, task });

        tracing::info!(addr = %self.addr, "control connection established");
    }

    async fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            tracing::debug!(addr = %self.addr, "disconnect requested while already disconnected");
            return;
        }

        if let Some(reader) = self.reader.lock().await.take() {
            reader.cancel.cancel();

            if let Some(mut writer) = self.writer.lock().await.take() {
                if let Err(e) = writer.shutdown().await {
                    tracing::warn!(addr = %self.addr, error = %e, "shutdown during disconnect failed");
                }
            }

            let _ = reader.task.await;
        }

        tracing::info!(addr = %self.addr, "control connection closed");
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send(&self, data: &[u8]) -> Result<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }

        let mut writer = self.writer.lock().await;
        let w = writer.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(addr = %self.addr, bytes = data.len(), "sending control payload");

        w.write_all(data).await.map_err(map_io_error)?;
        w.flush().await.map_err(map_io_error)?;

        Ok(())
    }
}

/// Background receive loop: one task per connection, lifetime bound to
/// connect/disconnect.
///
/// Forwards each successful read into `sink` as an owned payload.
/// Cancellation ends the loop cleanly; EOF and read errors clear the
/// connected flag and end the loop. The loop-stopped diagnostic is
/// emitted on every exit path.
async fn receive_loop(
    mut reader: ReadHalf<TcpStream>,
    sink: mpsc::Sender<Vec<u8>>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    addr: String,
) {
    if !connected.load(Ordering::SeqCst) {
        tracing::error!(addr = %addr, "receive loop started without a connection");
        tracing::debug!(addr = %addr, "control receive loop stopped");
        return;
    }

    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                tracing::debug!(addr = %addr, "receive loop cancelled");
                break;
            }

            result = reader.read(&mut buf) => match result {
                Ok(0) => {
                    // TCP: 0 bytes read means the peer closed the connection.
                    tracing::warn!(addr = %addr, "peer closed control connection");
                    connected.store(false, Ordering::SeqCst);
                    break;
                }
                Ok(n) => {
                    tracing::trace!(addr = %addr, bytes = n, "control payload received");
                    if sink.send(buf[..n].to_vec()).await.is_err() {
                        tracing::debug!(addr = %addr, "payload sink closed, ending receive loop");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(addr = %addr, error = %e, "control read failed");
                    connected.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    tracing::debug!(addr = %addr, "control receive loop stopped");
}

/// Map a data-path I/O error to the appropriate [`Error`] variant.
fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::ConnectionAborted => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}
