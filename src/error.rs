//! Error types for the telemetry pipeline.
//!
//! Every fallible operation in the crate returns [`TelemetryError`]. Variants carry
//! structured context for logging, and [`TelemetryError::kind`] collapses them into
//! a fieldless [`ErrorKind`] for callers that only need to branch on the failure mode.
//!
//! ## Error Categories
//!
//! - **Argument Errors**: zero capacities, oversized payloads, bad configuration values
//! - **Resource Errors**: slot allocation or worker thread creation failed
//! - **Queue Conditions**: full / empty ring (expected steady-state outcomes, not faults)
//! - **Protocol Errors**: wire header validation failures
//! - **Sink Errors**: transport initialization and send failures
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use sensorlink::{ErrorKind, TelemetryError};
//!
//! let error = TelemetryError::QueueFull { capacity: 4 };
//! assert_eq!(error.kind(), ErrorKind::QueueFull);
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Allocation failed for {context}")]
    AllocationFailure {
        context: String,
        #[source]
        source: Option<std::collections::TryReserveError>,
    },

    #[error("Ring buffer full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("Ring buffer empty")]
    QueueEmpty,

    #[error("Protocol magic mismatch: expected {expected:#010x}, found {found:#010x}")]
    ProtocolMagicMismatch { expected: u32, found: u32 },

    #[error("Protocol version mismatch: expected {expected}, found {found}")]
    ProtocolVersionMismatch { expected: u8, found: u8 },

    #[error("Protocol header length mismatch: expected {expected}, found {found}")]
    ProtocolHeaderLengthMismatch { expected: u8, found: u8 },

    #[error("Truncated input: need {needed} bytes, have {available}")]
    ProtocolTruncated { needed: usize, available: usize },

    #[error("Declared payload length {declared} exceeds the {available} bytes available")]
    ProtocolPayloadOutOfRange { declared: usize, available: usize },

    #[error("Sink send failed: {reason}")]
    SinkSendFailure {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Sink initialization failed for endpoint '{endpoint}'")]
    SinkInit {
        endpoint: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Failed to create {what}")]
    ThreadOrSyncCreationFailure {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fieldless classification of [`TelemetryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    AllocationFailure,
    QueueFull,
    QueueEmpty,
    ProtocolMagicMismatch,
    ProtocolVersionMismatch,
    ProtocolHeaderLengthMismatch,
    ProtocolTruncated,
    ProtocolPayloadOutOfRange,
    SinkSendFailure,
    SinkInit,
    ThreadOrSyncCreationFailure,
    Config,
}

impl TelemetryError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TelemetryError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            TelemetryError::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            TelemetryError::QueueFull { .. } => ErrorKind::QueueFull,
            TelemetryError::QueueEmpty => ErrorKind::QueueEmpty,
            TelemetryError::ProtocolMagicMismatch { .. } => ErrorKind::ProtocolMagicMismatch,
            TelemetryError::ProtocolVersionMismatch { .. } => ErrorKind::ProtocolVersionMismatch,
            TelemetryError::ProtocolHeaderLengthMismatch { .. } => {
                ErrorKind::ProtocolHeaderLengthMismatch
            }
            TelemetryError::ProtocolTruncated { .. } => ErrorKind::ProtocolTruncated,
            TelemetryError::ProtocolPayloadOutOfRange { .. } => {
                ErrorKind::ProtocolPayloadOutOfRange
            }
            TelemetryError::SinkSendFailure { .. } => ErrorKind::SinkSendFailure,
            TelemetryError::SinkInit { .. } => ErrorKind::SinkInit,
            TelemetryError::ThreadOrSyncCreationFailure { .. } => {
                ErrorKind::ThreadOrSyncCreationFailure
            }
            TelemetryError::Config { .. } | TelemetryError::ConfigFile { .. } => ErrorKind::Config,
        }
    }

    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::QueueFull { .. } => true,
            TelemetryError::QueueEmpty => true,
            TelemetryError::SinkSendFailure { .. } => true,
            TelemetryError::SinkInit { .. } => true,
            TelemetryError::ThreadOrSyncCreationFailure { .. } => true,
            TelemetryError::AllocationFailure { .. } => false,
            TelemetryError::InvalidArgument { .. } => false,
            TelemetryError::ProtocolMagicMismatch { .. } => false,
            TelemetryError::ProtocolVersionMismatch { .. } => false,
            TelemetryError::ProtocolHeaderLengthMismatch { .. } => false,
            TelemetryError::ProtocolTruncated { .. } => false,
            TelemetryError::ProtocolPayloadOutOfRange { .. } => false,
            TelemetryError::Config { .. } => false,
            TelemetryError::ConfigFile { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::InvalidArgument { .. } => vec![
                "Check capacities and drain limits are non-zero",
                "Keep event payloads within 128 bytes",
            ],
            TelemetryError::AllocationFailure { .. } => {
                vec!["Reduce the ring capacity", "Check available memory on the device"]
            }
            TelemetryError::QueueFull { .. } => vec![
                "Notify the agent more often so it drains sooner",
                "Increase the ring capacity",
                "Reduce the event rate",
            ],
            TelemetryError::QueueEmpty => vec!["Nothing to do; wait for the producer"],
            TelemetryError::ProtocolMagicMismatch { .. } => vec![
                "Verify the sender speaks the TEL1 protocol",
                "Check the datagram is not from another service on the same port",
            ],
            TelemetryError::ProtocolVersionMismatch { .. }
            | TelemetryError::ProtocolHeaderLengthMismatch { .. } => {
                vec!["Upgrade sender and receiver to the same protocol version"]
            }
            TelemetryError::ProtocolTruncated { .. }
            | TelemetryError::ProtocolPayloadOutOfRange { .. } => vec![
                "Check the datagram size limit on the sender",
                "Increase the receive buffer size",
            ],
            TelemetryError::SinkSendFailure { .. } => vec![
                "Check the destination endpoint is reachable",
                "Lower max_datagram_bytes if datagrams are rejected",
            ],
            TelemetryError::SinkInit { .. } => vec![
                "Check the endpoint is a valid host:port",
                "Verify the local network interface is up",
            ],
            TelemetryError::ThreadOrSyncCreationFailure { .. } => vec![
                "Check process thread limits",
                "Release unused agents before starting new ones",
            ],
            TelemetryError::Config { .. } => {
                vec!["Check the YAML syntax", "Compare field names with TelemetryConfig"]
            }
            TelemetryError::ConfigFile { .. } => {
                vec!["Check the file exists and is readable", "Check file permissions"]
            }
        }
    }

    /// Helper constructor for argument validation errors.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        TelemetryError::InvalidArgument { reason: reason.into() }
    }

    /// Helper constructor for send failures without an I/O source.
    pub fn send_failed(reason: impl Into<String>) -> Self {
        TelemetryError::SinkSendFailure { reason: reason.into(), source: None }
    }

    /// Helper constructor for send failures caused by an I/O error.
    pub fn send_failed_with_source(reason: impl Into<String>, source: std::io::Error) -> Self {
        TelemetryError::SinkSendFailure { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration parse errors.
    pub fn config_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::Config { context: context.into(), details: details.into() }
    }
}
