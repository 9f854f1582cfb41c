//! Binary command/response framing for the receiver control protocol.
//!
//! The control channel carries length-prefixed binary frames. Every frame
//! starts with a little-endian `u16` header: the low 13 bits hold the
//! TOTAL frame length (header included), the top 3 bits hold the message
//! kind. Control frames carry a little-endian `u16` item code followed by
//! item-specific parameters.
//!
//! ```text
//! Header:          <length:13><kind:3>          (u16, little-endian)
//! Control payload: <item:u16 LE><parameters...>
//! ```
//!
//! All encoding/decoding in this module is pure -- no state, no I/O,
//! safely callable from any task.

use sdrlink_core::{Error, Result};

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 2;

/// Maximum total frame length representable in the 13-bit length field.
pub const MAX_FRAME_LEN: usize = 0x1FFF;

/// Control item: receiver capture state (run/stop).
pub const ITEM_RECEIVER_STATE: u16 = 0x0018;

/// Control item: tuner center frequency.
pub const ITEM_FREQUENCY: u16 = 0x0020;

/// Control item: IQ output sample rate.
pub const ITEM_SAMPLE_RATE: u16 = 0x00B8;

/// Control item: data-channel output packet size.
pub const ITEM_PACKET_SIZE: u16 = 0x00C4;

/// Highest tunable frequency: the wire format carries 40 bits.
pub const MAX_FREQUENCY_HZ: u64 = (1 << 40) - 1;

// ---------------------------------------------------------------------------
// Message kinds
// ---------------------------------------------------------------------------

/// The 3-bit message kind carried in every frame header.
///
/// All eight codes map to a kind, so kind decoding itself cannot fail;
/// only the length field can make a frame invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Set a control item (host to receiver); also the receiver's ack and
    /// its unsolicited status reports.
    ControlSet,
    /// Request the current value of a control item.
    ControlGet,
    /// Request the valid range of a control item.
    ControlRangeGet,
    /// Acknowledgement for a data item.
    DataAck,
    /// Data item stream 0.
    Data0,
    /// Data item stream 1.
    Data1,
    /// Data item stream 2.
    Data2,
    /// Data item stream 3.
    Data3,
}

impl MessageKind {
    /// The 3-bit wire code for this kind.
    pub fn code(self) -> u8 {
        match self {
            MessageKind::ControlSet => 0,
            MessageKind::ControlGet => 1,
            MessageKind::ControlRangeGet => 2,
            MessageKind::DataAck => 3,
            MessageKind::Data0 => 4,
            MessageKind::Data1 => 5,
            MessageKind::Data2 => 6,
            MessageKind::Data3 => 7,
        }
    }

    /// Decode a 3-bit wire code. Only the low 3 bits are inspected.
    pub fn from_code(code: u8) -> MessageKind {
        match code & 0x07 {
            0 => MessageKind::ControlSet,
            1 => MessageKind::ControlGet,
            2 => MessageKind::ControlRangeGet,
            3 => MessageKind::DataAck,
            4 => MessageKind::Data0,
            5 => MessageKind::Data1,
            6 => MessageKind::Data2,
            _ => MessageKind::Data3,
        }
    }
}

/// Tuner channel selector for multi-channel receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// The first tuner channel.
    A,
    /// The second tuner channel.
    B,
    /// Both channels at once.
    All,
}

impl Channel {
    /// The wire code for this channel selector.
    pub fn code(self) -> u8 {
        match self {
            Channel::A => 0x00,
            Channel::B => 0x02,
            Channel::All => 0xFF,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame encoding / decoding
// ---------------------------------------------------------------------------

/// Encode a frame with the given kind and payload.
///
/// Deterministic: the same kind and payload always produce the same
/// bytes. Fails with [`Error::InvalidParameter`] when the total frame
/// length exceeds the 13-bit length field.
pub fn build_frame(kind: MessageKind, payload: &[u8]) -> Result<Vec<u8>> {
    let total = payload.len() + HEADER_LEN;
    if total > MAX_FRAME_LEN {
        return Err(Error::InvalidParameter(format!(
            "frame length {} exceeds maximum {}",
            total, MAX_FRAME_LEN
        )));
    }

    let header = (total as u16) | ((kind.code() as u16) << 13);
    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&header.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Decode a frame into its kind and payload.
///
/// Fails with [`Error::Framing`] when the buffer is shorter than the
/// header, when the declared length is below the header size, or when the
/// declared length does not match the bytes available. Arbitrary garbage
/// input yields an error, never a panic.
pub fn parse_frame(bytes: &[u8]) -> Result<(MessageKind, &[u8])> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::Framing(format!(
            "frame shorter than {}-byte header ({} bytes)",
            HEADER_LEN,
            bytes.len()
        )));
    }

    let header = u16::from_le_bytes([bytes[0], bytes[1]]);
    let length = (header & 0x1FFF) as usize;
    let kind = MessageKind::from_code((header >> 13) as u8);

    if length < HEADER_LEN {
        return Err(Error::Framing(format!(
            "declared length {} below header size",
            length
        )));
    }
    if length != bytes.len() {
        return Err(Error::Framing(format!(
            "declared length {} does not match {} bytes available",
            length,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_LEN..]))
}

/// Split a control frame payload into its item code and parameters.
pub fn parse_control_item(payload: &[u8]) -> Result<(u16, &[u8])> {
    if payload.len() < 2 {
        return Err(Error::Framing(format!(
            "control payload shorter than 2-byte item code ({} bytes)",
            payload.len()
        )));
    }
    let item = u16::from_le_bytes([payload[0], payload[1]]);
    Ok((item, &payload[2..]))
}

/// Encode a control frame for `item` with the given parameters.
///
/// Control item parameter blocks are a handful of bytes, far below the
/// length-field limit, so this cannot fail.
fn control_item_frame(kind: MessageKind, item: u16, params: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(2 + params.len());
    payload.extend_from_slice(&item.to_le_bytes());
    payload.extend_from_slice(params);

    let total = payload.len() + HEADER_LEN;
    let header = (total as u16) | ((kind.code() as u16) << 13);
    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&header.to_le_bytes());
    frame.extend_from_slice(&payload);
    frame
}

// ---------------------------------------------------------------------------
// Command builders
//
// Each builder returns a complete wire frame ready for the control
// channel.
// ---------------------------------------------------------------------------

/// Build a receiver capture state command.
///
/// `run = true` starts the device-side capture, `false` halts it. The
/// parameter block selects complex IQ output and contiguous capture.
pub fn cmd_receiver_state(run: bool) -> Vec<u8> {
    let state = if run { 0x02 } else { 0x01 };
    control_item_frame(MessageKind::ControlSet, ITEM_RECEIVER_STATE, &[0x80, state, 0x00, 0x00])
}

/// Build a tuner frequency command.
///
/// The frequency travels as 40 bits little-endian, so values at or above
/// 2^40 Hz are rejected with [`Error::InvalidParameter`].
pub fn cmd_frequency(channel: Channel, freq_hz: u64) -> Result<Vec<u8>> {
    if freq_hz > MAX_FREQUENCY_HZ {
        return Err(Error::InvalidParameter(format!(
            "frequency {} Hz exceeds maximum {} Hz",
            freq_hz, MAX_FREQUENCY_HZ
        )));
    }

    let freq_bytes = freq_hz.to_le_bytes();
    let mut params = [0u8; 6];
    params[0] = channel.code();
    params[1..6].copy_from_slice(&freq_bytes[..5]);
    Ok(control_item_frame(
        MessageKind::ControlSet,
        ITEM_FREQUENCY,
        &params,
    ))
}

/// Build an IQ output sample rate command.
///
/// A zero rate is rejected with [`Error::InvalidParameter`].
pub fn cmd_sample_rate(rate: u32) -> Result<Vec<u8>> {
    if rate == 0 {
        return Err(Error::InvalidParameter("sample rate must be nonzero".into()));
    }

    let mut params = [0u8; 5];
    params[1..5].copy_from_slice(&rate.to_le_bytes());
    Ok(control_item_frame(
        MessageKind::ControlSet,
        ITEM_SAMPLE_RATE,
        &params,
    ))
}

/// Build a data-channel output packet size command.
///
/// `large = true` selects full-MTU data packets, `false` the small frame
/// size used on constrained links.
pub fn cmd_packet_size(large: bool) -> Vec<u8> {
    let size = if large { 0x00 } else { 0x01 };
    control_item_frame(MessageKind::ControlSet, ITEM_PACKET_SIZE, &[0x00, size])
}

/// Build a control item query (current value request).
pub fn cmd_request_item(item: u16) -> Vec<u8> {
    control_item_frame(MessageKind::ControlGet, item, &[])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
