//! Fixed 32-byte wire header
//!
//! All fields are big-endian at fixed offsets:
//!
//! ```text
//!  offset  size  field
//!  0       4     magic                 0x54454C31 ("TEL1")
//!  4       1     protocol_version      1
//!  5       1     header_length         32
//!  6       2     message_type          1 = EventBatch, 2 = HeartbeatBatch, 3 = MetricsBatch
//!  8       4     sequence_counter
//!  12      8     timestamp_monotonic_ns
//!  20      4     payload_len
//!  24      4     crc32                 opaque, carried verbatim
//!  28      4     reserved
//! ```
//!
//! The `crc32` field is reserved: the encoder writes whatever the caller supplies and
//! the decoder hands it back untouched. No checksum is computed or verified at this
//! layer.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Result, TelemetryError};

/// Protocol magic value, ASCII "TEL1".
pub const PROTOCOL_MAGIC: u32 = 0x5445_4C31;
/// Protocol version carried in every header.
pub const PROTOCOL_VERSION: u8 = 1;
/// Encoded header size in bytes.
pub const HEADER_LEN: usize = 32;

const OFFSET_MAGIC: usize = 0;
const OFFSET_VERSION: usize = 4;
const OFFSET_HEADER_LENGTH: usize = 5;
const OFFSET_MESSAGE_TYPE: usize = 6;
const OFFSET_SEQUENCE: usize = 8;
const OFFSET_TIMESTAMP: usize = 12;
const OFFSET_PAYLOAD_LEN: usize = 20;
const OFFSET_CRC32: usize = 24;
const OFFSET_RESERVED: usize = 28;

/// Kinds of framed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum MessageType {
    EventBatch = 1,
    HeartbeatBatch = 2,
    MetricsBatch = 3,
}

impl MessageType {
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Map a raw wire value, `None` for types this build does not know.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(MessageType::EventBatch),
            2 => Some(MessageType::HeartbeatBatch),
            3 => Some(MessageType::MetricsBatch),
            _ => None,
        }
    }
}

/// Decoded form of the 32-byte wire header.
///
/// `message_type` stays a raw `u16` so that receivers can skip message types added
/// by newer senders; use [`ProtocolHeader::kind`] for the typed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolHeader {
    pub magic: u32,
    pub protocol_version: u8,
    pub header_length: u8,
    pub message_type: u16,
    pub sequence_counter: u32,
    pub timestamp_monotonic_ns: u64,
    pub payload_len: u32,
    pub crc32: u32,
    pub reserved: u32,
}

impl ProtocolHeader {
    /// Build a header with the protocol constants filled in.
    pub fn new(
        message_type: MessageType,
        sequence_counter: u32,
        timestamp_monotonic_ns: u64,
        payload_len: u32,
    ) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            protocol_version: PROTOCOL_VERSION,
            header_length: HEADER_LEN as u8,
            message_type: message_type.as_u16(),
            sequence_counter,
            timestamp_monotonic_ns,
            payload_len,
            crc32: 0,
            reserved: 0,
        }
    }

    /// Typed message type, `None` if unknown.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u16(self.message_type)
    }

    /// Check the three constant fields.
    ///
    /// Magic is checked first so foreign traffic is always reported as a magic
    /// mismatch, whatever else it contains.
    pub fn validate(&self) -> Result<()> {
        if self.magic != PROTOCOL_MAGIC {
            return Err(TelemetryError::ProtocolMagicMismatch {
                expected: PROTOCOL_MAGIC,
                found: self.magic,
            });
        }

        if self.protocol_version != PROTOCOL_VERSION {
            return Err(TelemetryError::ProtocolVersionMismatch {
                expected: PROTOCOL_VERSION,
                found: self.protocol_version,
            });
        }

        if self.header_length as usize != HEADER_LEN {
            return Err(TelemetryError::ProtocolHeaderLengthMismatch {
                expected: HEADER_LEN as u8,
                found: self.header_length,
            });
        }

        Ok(())
    }

    pub fn encode(&self) -> Result<[u8; HEADER_LEN]> {
        encode_header(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_header(bytes)
    }
}

/// Serialize `header` into its 32-byte wire form.
///
/// The constant fields must already hold the protocol values; they are validated,
/// never rewritten.
pub fn encode_header(header: &ProtocolHeader) -> Result<[u8; HEADER_LEN]> {
    header.validate()?;

    let mut buf = [0u8; HEADER_LEN];
    write_u32_be(&mut buf, OFFSET_MAGIC, header.magic);
    buf[OFFSET_VERSION] = header.protocol_version;
    buf[OFFSET_HEADER_LENGTH] = header.header_length;
    write_u16_be(&mut buf, OFFSET_MESSAGE_TYPE, header.message_type);
    write_u32_be(&mut buf, OFFSET_SEQUENCE, header.sequence_counter);
    write_u64_be(&mut buf, OFFSET_TIMESTAMP, header.timestamp_monotonic_ns);
    write_u32_be(&mut buf, OFFSET_PAYLOAD_LEN, header.payload_len);
    write_u32_be(&mut buf, OFFSET_CRC32, header.crc32);
    write_u32_be(&mut buf, OFFSET_RESERVED, header.reserved);

    Ok(buf)
}

/// Parse and validate a header from the start of `bytes`.
///
/// `bytes` is the whole received message: the declared `payload_len` must fit in
/// what follows the header.
pub fn decode_header(bytes: &[u8]) -> Result<ProtocolHeader> {
    trace!(len = bytes.len(), "Decoding protocol header");

    if bytes.len() < HEADER_LEN {
        return Err(TelemetryError::ProtocolTruncated { needed: HEADER_LEN, available: bytes.len() });
    }

    let header = ProtocolHeader {
        magic: read_u32_be(bytes, OFFSET_MAGIC),
        protocol_version: bytes[OFFSET_VERSION],
        header_length: bytes[OFFSET_HEADER_LENGTH],
        message_type: read_u16_be(bytes, OFFSET_MESSAGE_TYPE),
        sequence_counter: read_u32_be(bytes, OFFSET_SEQUENCE),
        timestamp_monotonic_ns: read_u64_be(bytes, OFFSET_TIMESTAMP),
        payload_len: read_u32_be(bytes, OFFSET_PAYLOAD_LEN),
        crc32: read_u32_be(bytes, OFFSET_CRC32),
        reserved: read_u32_be(bytes, OFFSET_RESERVED),
    };

    header.validate()?;

    let available = bytes.len() - HEADER_LEN;
    if header.payload_len as usize > available {
        return Err(TelemetryError::ProtocolPayloadOutOfRange {
            declared: header.payload_len as usize,
            available,
        });
    }

    Ok(header)
}

// Callers have already checked `data` covers `offset + size`.

pub(crate) fn read_u16_be(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

pub(crate) fn read_u32_be(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

pub(crate) fn read_u64_be(data: &[u8], offset: usize) -> u64 {
    u64::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
        data[offset + 4],
        data[offset + 5],
        data[offset + 6],
        data[offset + 7],
    ])
}

pub(crate) fn write_u16_be(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

pub(crate) fn write_u32_be(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

pub(crate) fn write_u64_be(data: &mut [u8], offset: usize, value: u64) {
    data[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
}
