//! Embedded telemetry pipeline.
//!
//! Sensorlink moves fixed-size events from a latency-sensitive producer to a
//! network collector without ever blocking the producer.
//!
//! # Features
//!
//! - **Lock-free SPSC ring**: fixed capacity, drop-and-count on overflow
//! - **Background agent**: one worker thread drains the ring on demand
//! - **Wire protocol**: 32-byte big-endian header with event batch framing
//! - **Pluggable sinks**: UDP collector sink and an in-process counting sink
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sensorlink::{EventLevel, EventRecord, RingBuffer, Sink, TelemetryAgent, TelemetryConfig, UdpSink};
//!
//! fn main() -> sensorlink::Result<()> {
//!     let config = TelemetryConfig::load("telemetry.yaml")?;
//!
//!     let mut ring = RingBuffer::new(config.ring_capacity)?;
//!     let mut sink = UdpSink::new();
//!     sink.init(&config.sink)?;
//!
//!     let (mut producer, consumer) = ring.split();
//!     std::thread::scope(|scope| {
//!         let agent = TelemetryAgent::start_with_config(scope, consumer, &mut sink, &config.agent)?;
//!
//!         for id in 0..100 {
//!             producer.push(EventRecord::new(id, EventLevel::Info, b"tick")?);
//!         }
//!         agent.notify();
//!
//!         let stats = agent.stop();
//!         println!("sent {} events", stats.sent);
//!         Ok(())
//!     })
//! }
//! ```

pub mod agent;
pub mod clock;
pub mod config;
mod error;
pub mod protocol;
pub mod ring;
mod sink;
pub mod sinks;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
mod wakeup;

pub use agent::{AgentCounters, AgentStats, Notifier, TelemetryAgent};
pub use config::{AgentConfig, SinkConfig, TelemetryConfig};
pub use error::*;
pub use protocol::{EventFrame, MessageType, ProtocolHeader, decode_header, encode_header};
pub use ring::{Consumer, Producer, RingBuffer};
pub use sink::Sink;
pub use sinks::{CountingSink, UdpSink};
pub use types::*;
