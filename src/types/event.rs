//! Fixed-size event record

use super::EventLevel;
use crate::{Result, TelemetryError, clock};

/// Maximum payload carried by a single event, in bytes.
pub const EVENT_PAYLOAD_MAX: usize = 128;

/// Application event as it travels through the ring buffer.
///
/// The record is `Copy` and has a fixed size so ring slots can be preallocated.
/// Bytes of `payload` beyond `payload_size` are always zero.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    event_id: u32,
    level: EventLevel,
    payload_size: u16,
    timestamp: u64,
    payload: [u8; EVENT_PAYLOAD_MAX],
}

impl EventRecord {
    /// Build an event stamped with the current monotonic time.
    ///
    /// Fails with `InvalidArgument` if `payload` is longer than [`EVENT_PAYLOAD_MAX`].
    pub fn new(event_id: u32, level: EventLevel, payload: &[u8]) -> Result<Self> {
        Self::with_timestamp(event_id, level, payload, clock::monotonic_ns())
    }

    /// Build an event with an explicit timestamp.
    pub fn with_timestamp(
        event_id: u32,
        level: EventLevel,
        payload: &[u8],
        timestamp: u64,
    ) -> Result<Self> {
        if payload.len() > EVENT_PAYLOAD_MAX {
            return Err(TelemetryError::invalid_argument(format!(
                "payload of {} bytes exceeds the {} byte maximum",
                payload.len(),
                EVENT_PAYLOAD_MAX
            )));
        }

        let mut buf = [0u8; EVENT_PAYLOAD_MAX];
        buf[..payload.len()].copy_from_slice(payload);

        Ok(Self { event_id, level, payload_size: payload.len() as u16, timestamp, payload: buf })
    }

    pub fn event_id(&self) -> u32 {
        self.event_id
    }

    pub fn level(&self) -> EventLevel {
        self.level
    }

    pub fn payload_size(&self) -> u16 {
        self.payload_size
    }

    /// Monotonic timestamp in nanoseconds.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The meaningful bytes of the payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.payload_size as usize]
    }
}

impl Default for EventRecord {
    fn default() -> Self {
        Self {
            event_id: 0,
            level: EventLevel::Debug,
            payload_size: 0,
            timestamp: 0,
            payload: [0u8; EVENT_PAYLOAD_MAX],
        }
    }
}

impl std::fmt::Debug for EventRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecord")
            .field("event_id", &self.event_id)
            .field("level", &self.level)
            .field("timestamp", &self.timestamp)
            .field("payload", &self.payload())
            .finish()
    }
}
