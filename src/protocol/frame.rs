//! Event batch framing
//!
//! An `EventBatch` frame is a [`ProtocolHeader`] followed by `payload_len` bytes of
//! back-to-back encoded events. Each event is a 16-byte big-endian prefix and its
//! payload bytes:
//!
//! ```text
//!  offset  size  field
//!  0       4     event_id
//!  4       1     level
//!  5       1     reserved (0)
//!  6       2     payload_size
//!  8       8     timestamp (ns)
//!  16      n     payload
//! ```

use tracing::trace;

use super::header::{
    HEADER_LEN, MessageType, ProtocolHeader, decode_header, encode_header, read_u16_be,
    read_u32_be, read_u64_be, write_u16_be, write_u32_be, write_u64_be,
};
use crate::{EVENT_PAYLOAD_MAX, EventLevel, EventRecord, Result, TelemetryError};

/// Size of the fixed per-event prefix.
pub const EVENT_WIRE_PREFIX_LEN: usize = 16;

/// A decoded `EventBatch` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    pub header: ProtocolHeader,
    pub events: Vec<EventRecord>,
}

/// Number of bytes `event` occupies on the wire.
pub fn encoded_event_len(event: &EventRecord) -> usize {
    EVENT_WIRE_PREFIX_LEN + event.payload_size() as usize
}

/// Append the wire form of `event` to `out`.
pub fn encode_event(event: &EventRecord, out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + EVENT_WIRE_PREFIX_LEN, 0);

    let prefix = &mut out[start..];
    write_u32_be(prefix, 0, event.event_id());
    prefix[4] = event.level().as_u8();
    prefix[5] = 0;
    write_u16_be(prefix, 6, event.payload_size());
    write_u64_be(prefix, 8, event.timestamp());

    out.extend_from_slice(event.payload());
}

/// Decode one event from the start of `bytes`, returning it and the bytes consumed.
pub fn decode_event(bytes: &[u8]) -> Result<(EventRecord, usize)> {
    if bytes.len() < EVENT_WIRE_PREFIX_LEN {
        return Err(TelemetryError::ProtocolTruncated {
            needed: EVENT_WIRE_PREFIX_LEN,
            available: bytes.len(),
        });
    }

    let event_id = read_u32_be(bytes, 0);
    let level = EventLevel::try_from(bytes[4])?;
    let payload_size = read_u16_be(bytes, 6) as usize;
    let timestamp = read_u64_be(bytes, 8);

    if payload_size > EVENT_PAYLOAD_MAX {
        return Err(TelemetryError::ProtocolPayloadOutOfRange {
            declared: payload_size,
            available: EVENT_PAYLOAD_MAX,
        });
    }

    let total = EVENT_WIRE_PREFIX_LEN + payload_size;
    if bytes.len() < total {
        return Err(TelemetryError::ProtocolTruncated { needed: total, available: bytes.len() });
    }

    let event = EventRecord::with_timestamp(
        event_id,
        level,
        &bytes[EVENT_WIRE_PREFIX_LEN..total],
        timestamp,
    )?;
    Ok((event, total))
}

/// Build a complete `EventBatch` frame carrying `events`.
pub fn encode_event_frame(sequence: u32, timestamp: u64, events: &[EventRecord]) -> Result<Vec<u8>> {
    let payload_len: usize = events.iter().map(encoded_event_len).sum();
    let payload_len_u32 = u32::try_from(payload_len).map_err(|_| {
        TelemetryError::invalid_argument(format!("frame payload of {} bytes is too large", payload_len))
    })?;

    let header = ProtocolHeader::new(MessageType::EventBatch, sequence, timestamp, payload_len_u32);

    let mut frame = Vec::with_capacity(HEADER_LEN + payload_len);
    frame.extend_from_slice(&encode_header(&header)?);
    for event in events {
        encode_event(event, &mut frame);
    }

    trace!(sequence, events = events.len(), bytes = frame.len(), "Encoded event frame");
    Ok(frame)
}

/// Decode a complete `EventBatch` frame.
///
/// Bytes after the declared payload are ignored.
pub fn decode_event_frame(bytes: &[u8]) -> Result<EventFrame> {
    let header = decode_header(bytes)?;

    if header.kind() != Some(MessageType::EventBatch) {
        return Err(TelemetryError::invalid_argument(format!(
            "expected an event batch, found message type {}",
            header.message_type
        )));
    }

    let mut payload = &bytes[HEADER_LEN..HEADER_LEN + header.payload_len as usize];
    let mut events = Vec::new();
    while !payload.is_empty() {
        let (event, used) = decode_event(payload)?;
        events.push(event);
        payload = &payload[used..];
    }

    Ok(EventFrame { header, events })
}
