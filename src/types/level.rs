//! Event severity levels

use serde::{Deserialize, Serialize};

use crate::{Result, TelemetryError};

/// Severity attached to every [`EventRecord`](super::EventRecord).
///
/// The discriminants are the on-wire byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventLevel {
    #[default]
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl EventLevel {
    /// Wire representation of this level.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a wire byte, `None` for unknown levels.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(EventLevel::Debug),
            1 => Some(EventLevel::Info),
            2 => Some(EventLevel::Warning),
            3 => Some(EventLevel::Error),
            _ => None,
        }
    }

    /// Short uppercase label for log output.
    pub const fn label(self) -> &'static str {
        match self {
            EventLevel::Debug => "DEBUG",
            EventLevel::Info => "INFO",
            EventLevel::Warning => "WARN",
            EventLevel::Error => "ERROR",
        }
    }
}

impl TryFrom<u8> for EventLevel {
    type Error = TelemetryError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or_else(|| {
            TelemetryError::invalid_argument(format!("unknown event level {}", value))
        })
    }
}

impl std::fmt::Display for EventLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
