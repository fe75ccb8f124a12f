//! Pipeline configuration
//!
//! Configuration is plain serde data so it can be embedded in a host application's
//! own config or loaded from a standalone YAML file:
//!
//! ```yaml
//! ring_capacity: 2048
//! agent:
//!   max_drain_per_wake: 64
//! sink:
//!   endpoint: "10.0.0.5:9000"
//!   max_datagram_bytes: 1024
//! ```
//!
//! Missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, TelemetryError};

/// Datagram size used when none is configured.
pub const DEFAULT_MAX_DATAGRAM_BYTES: u32 = 512;

/// Upper bound on datagram size, below the common path MTU.
pub const MAX_DATAGRAM_BYTES_LIMIT: u32 = 1200;

/// Settings handed to [`Sink::init`](crate::Sink::init).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// `host:port` of the collector.
    pub endpoint: String,
    /// Largest datagram a sink may emit. `0` selects the default.
    pub max_datagram_bytes: u32,
}

impl SinkConfig {
    /// Datagram limit after applying the default and the fragmentation clamp.
    pub fn effective_max_datagram_bytes(&self) -> usize {
        let configured = match self.max_datagram_bytes {
            0 => DEFAULT_MAX_DATAGRAM_BYTES,
            n => n,
        };
        configured.min(MAX_DATAGRAM_BYTES_LIMIT) as usize
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:9000".to_string(),
            max_datagram_bytes: DEFAULT_MAX_DATAGRAM_BYTES,
        }
    }
}

/// Settings for the background drain worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Records forwarded per batch before the worker re-checks the stop flag.
    pub max_drain_per_wake: usize,
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_drain_per_wake == 0 {
            return Err(TelemetryError::invalid_argument("max_drain_per_wake must be at least 1"));
        }
        if self.thread_name.is_empty() || self.thread_name.contains('\0') {
            return Err(TelemetryError::invalid_argument(
                "thread_name must be non-empty and free of NUL bytes",
            ));
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_drain_per_wake: 50, thread_name: "telemetry-agent".to_string() }
    }
}

/// Top-level configuration for a ring, its agent and its sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub ring_capacity: usize,
    pub agent: AgentConfig,
    pub sink: SinkConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { ring_capacity: 1024, agent: AgentConfig::default(), sink: SinkConfig::default() }
    }
}

impl TelemetryConfig {
    /// Parse and validate YAML configuration.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            TelemetryError::config_error("TelemetryConfig deserialization", e.to_string())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| TelemetryError::ConfigFile { path: path.to_path_buf(), source })?;

        let config = Self::parse(&yaml)?;
        debug!(
            path = %path.display(),
            ring_capacity = config.ring_capacity,
            endpoint = %config.sink.endpoint,
            "Loaded telemetry configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ring_capacity == 0 {
            return Err(TelemetryError::config_error("ring_capacity", "must be at least 1"));
        }
        self.agent
            .validate()
            .map_err(|e| TelemetryError::config_error("agent", e.to_string()))?;
        if self.sink.endpoint.is_empty() {
            return Err(TelemetryError::config_error("sink.endpoint", "must not be empty"));
        }
        Ok(())
    }
}
