//! Protocol client for a networked SDR receiver.
//!
//! [`ReceiverClient`] owns the device-level protocol semantics on top of
//! the two channel capabilities: it sequences the initialization
//! handshake, correlates exactly one outstanding control request with its
//! response, routes unsolicited traffic to subscribers, and gates IQ
//! streaming on control-channel state.
//!
//! The client never talks to sockets directly. It is constructed over
//! [`ControlLink`] and [`DataLink`] trait objects plus the receiving ends
//! of the links' payload sinks, so test doubles substitute for real
//! transports without any private-state access.
//!
//! # Request/response correlation
//!
//! The receiver replies to requests strictly in order, one at a time, with
//! no request identifiers on the wire. The client therefore holds at most
//! one pending-completion handle: the next control-channel payload after a
//! send fulfills it. A second request while one is outstanding is rejected
//! with [`Error::RequestPending`] rather than queued -- on a session where
//! replies can be lost, queue depth would be invisible to callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use sdrlink_core::error::{Error, Result};
use sdrlink_core::events::DeviceEvent;
use sdrlink_core::link::{ControlLink, DataLink};

use crate::framer::{self, Channel};

/// Default bound on the wait for a correlated response (5 seconds).
///
/// The protocol itself has no timeout; bounding the wait keeps a lost
/// reply from wedging the session forever. The pending slot is released
/// on timeout so the next request can proceed.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Sample rate configured during the initialization sequence.
pub const DEFAULT_SAMPLE_RATE: u32 = 250_000;

/// Broadcast channel capacity for [`DeviceEvent`] subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Options for configuring a [`ReceiverClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Bound on the wait for each correlated response.
    pub request_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Protocol client for a networked SDR receiver.
///
/// Composes one control link and one data link (injected, shared through
/// `Arc`). Methods take `&self`; the client is safe to share across
/// tasks.
pub struct ReceiverClient {
    /// The control channel capability.
    control: Arc<dyn ControlLink>,
    /// The data channel capability.
    data: Arc<dyn DataLink>,
    /// The single pending-completion handle. At most one request is in
    /// flight; access is serialized through this mutex.
    pending: Arc<Mutex<Option<oneshot::Sender<Vec<u8>>>>>,
    /// Whether IQ streaming is active.
    iq_started: AtomicBool,
    /// Event broadcast channel sender.
    event_tx: broadcast::Sender<DeviceEvent>,
    /// Background control-payload dispatch task.
    dispatch_task: JoinHandle<()>,
    /// Background datagram forwarding task.
    data_task: JoinHandle<()>,
    /// Bound on the wait for each correlated response.
    request_timeout: Duration,
}

impl ReceiverClient {
    /// Create a client over the given links with default options.
    ///
    /// `control_rx` and `data_rx` are the receiving ends of the payload
    /// sinks the links were constructed with.
    pub fn new(
        control: Arc<dyn ControlLink>,
        data: Arc<dyn DataLink>,
        control_rx: mpsc::Receiver<Vec<u8>>,
        data_rx: mpsc::Receiver<Vec<u8>>,
    ) -> Self {
        Self::with_options(control, data, control_rx, data_rx, ClientOptions::default())
    }

    /// Create a client with custom options.
    pub fn with_options(
        control: Arc<dyn ControlLink>,
        data: Arc<dyn DataLink>,
        control_rx: mpsc::Receiver<Vec<u8>>,
        data_rx: mpsc::Receiver<Vec<u8>>,
        options: ClientOptions,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let pending: Arc<Mutex<Option<oneshot::Sender<Vec<u8>>>>> = Arc::new(Mutex::new(None));

        let dispatch_task = {
            let pending = Arc::clone(&pending);
            let event_tx = event_tx.clone();
            tokio::spawn(dispatch_loop(control_rx, pending, event_tx))
        };

        let data_task = {
            let event_tx = event_tx.clone();
            tokio::spawn(data_loop(data_rx, event_tx))
        };

        Self {
            control,
            data,
            pending,
            iq_started: AtomicBool::new(false),
            event_tx,
            dispatch_task,
            data_task,
            request_timeout: options.request_timeout,
        }
    }

    /// Connect the control channel and run the initialization sequence.
    ///
    /// The connect attempt itself is best-effort; the initialization
    /// sequence is issued unconditionally afterward. Its three control-set
    /// commands -- halt capture, output packet size, default sample rate --
    /// each await their correlated response in order. When the connect
    /// attempt failed, the first command reports
    /// [`Error::NotConnected`] and that error propagates.
    pub async fn connect(&self) -> Result<()> {
        self.control.connect().await;

        self.send_control_request(&framer::cmd_receiver_state(false))
            .await?;
        self.send_control_request(&framer::cmd_packet_size(true))
            .await?;
        self.send_control_request(&framer::cmd_sample_rate(DEFAULT_SAMPLE_RATE)?)
            .await?;

        let _ = self.event_tx.send(DeviceEvent::Connected);
        tracing::debug!("receiver session initialized");
        Ok(())
    }

    /// Disconnect the control channel.
    ///
    /// Any in-flight request is abandoned; its caller observes
    /// [`Error::ConnectionLost`]. Safe to call with no prior connection.
    /// IQ streaming is NOT force-stopped: callers own the
    /// stop-then-disconnect ordering.
    pub async fn disconnect(&self) {
        self.pending.lock().await.take();
        self.control.disconnect().await;
        let _ = self.event_tx.send(DeviceEvent::Disconnected);
    }

    /// Tune the given channel to a new center frequency.
    ///
    /// Sends one control-set command through the request path and
    /// completes when the correlated response arrives. The response is
    /// validated as a well-formed frame.
    pub async fn change_frequency(&self, freq_hz: u64, channel: Channel) -> Result<()> {
        let cmd = framer::cmd_frequency(channel, freq_hz)?;
        let response = self.send_control_request(&cmd).await?;

        // The receiver acks a set by echoing the control item.
        let (kind, payload) = framer::parse_frame(&response)?;
        let (item, _) = framer::parse_control_item(payload)?;
        if item != framer::ITEM_FREQUENCY {
            tracing::warn!(
                item = format!("0x{:04X}", item),
                "frequency ack carried an unexpected control item"
            );
        }
        tracing::debug!(?kind, ?channel, freq_hz, "frequency change acknowledged");
        Ok(())
    }

    /// Start IQ streaming.
    ///
    /// When the control channel is not connected this is a logged no-op:
    /// nothing is sent, nothing is started, no error is reported.
    /// Otherwise the data link's listen loop is started and
    /// [`iq_started`](ReceiverClient::iq_started) becomes `true` once the
    /// start call returns.
    pub async fn start_iq(&self) {
        if !self.control.is_connected() {
            tracing::debug!("IQ start requested while control channel disconnected, ignoring");
            return;
        }

        self.data.start_listening().await;
        self.iq_started.store(true, Ordering::SeqCst);
        tracing::debug!("IQ streaming started");
    }

    /// Stop IQ streaming.
    pub async fn stop_iq(&self) {
        self.data.stop_listening().await;
        self.iq_started.store(false, Ordering::SeqCst);
        tracing::debug!("IQ streaming stopped");
    }

    /// Whether the control channel is currently connected.
    pub fn connected(&self) -> bool {
        self.control.is_connected()
    }

    /// Whether IQ streaming is active.
    pub fn iq_started(&self) -> bool {
        self.iq_started.load(Ordering::SeqCst)
    }

    /// Get an event broadcast receiver.
    ///
    /// Multiple subscribers can be created; each gets an independent copy
    /// of every event.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_tx.subscribe()
    }

    /// Send one control request and await its correlated response.
    ///
    /// The single in-flight request path: fails fast with
    /// [`Error::NotConnected`] when the control channel is down and with
    /// [`Error::RequestPending`] when another request already holds the
    /// slot. The next control-channel payload after the send fulfills the
    /// request; the wait is bounded by
    /// [`ClientOptions::request_timeout`].
    pub async fn send_control_request(&self, frame: &[u8]) -> Result<Vec<u8>> {
        if !self.control.is_connected() {
            return Err(Error::NotConnected);
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.is_some() {
                return Err(Error::RequestPending);
            }
            *pending = Some(tx);
        }

        if let Err(e) = self.control.send(frame).await {
            // Release the slot; the request never reached the wire.
            self.pending.lock().await.take();
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(payload)) => Ok(payload),
            // The sender was dropped: the request was abandoned by a
            // disconnect before a response arrived.
            Ok(Err(_)) => Err(Error::ConnectionLost),
            Err(_) => {
                self.pending.lock().await.take();
                Err(Error::Timeout)
            }
        }
    }
}

impl Drop for ReceiverClient {
    fn drop(&mut self) {
        self.dispatch_task.abort();
        self.data_task.abort();
    }
}

// ---------------------------------------------------------------------------
// Dispatch loops
// ---------------------------------------------------------------------------

/// Route every control-channel payload: fulfill the pending request if one
/// exists, otherwise surface the payload as unsolicited.
///
/// The unsolicited path never fails and never blocks dispatch -- a
/// broadcast send to zero or lagged subscribers is simply dropped, and the
/// pending slot is untouched.
async fn dispatch_loop(
    mut control_rx: mpsc::Receiver<Vec<u8>>,
    pending: Arc<Mutex<Option<oneshot::Sender<Vec<u8>>>>>,
    event_tx: broadcast::Sender<DeviceEvent>,
) {
    while let Some(payload) = control_rx.recv().await {
        let waiter = pending.lock().await.take();
        match waiter {
            Some(tx) => {
                if tx.send(payload).is_err() {
                    tracing::trace!("requester gone before its response arrived");
                }
            }
            None => {
                tracing::trace!(bytes = payload.len(), "unsolicited control payload");
                let _ = event_tx.send(DeviceEvent::Unsolicited(payload));
            }
        }
    }
    tracing::debug!("control dispatch loop stopped");
}

/// Forward each received datagram to subscribers as an IQ data event.
async fn data_loop(mut data_rx: mpsc::Receiver<Vec<u8>>, event_tx: broadcast::Sender<DeviceEvent>) {
    while let Some(datagram) = data_rx.recv().await {
        let _ = event_tx.send(DeviceEvent::IqData(datagram));
    }
    tracing::debug!("data forwarding loop stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
