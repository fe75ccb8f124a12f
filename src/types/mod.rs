//! Core value types carried through the pipeline.
//!
//! - [`EventRecord`] is the fixed-size unit stored in ring slots and sent to sinks
//! - [`EventLevel`] is its severity, encoded as a single byte on the wire
//!
//! ## Usage Example
//!
//! ```rust
//! use sensorlink::types::{EventLevel, EventRecord, EVENT_PAYLOAD_MAX};
//!
//! let event = EventRecord::with_timestamp(7, EventLevel::Warning, b"overtemp", 1_000).unwrap();
//! assert_eq!(event.payload(), b"overtemp");
//! assert_eq!(event.payload_size(), 8);
//!
//! let too_big = vec![0u8; EVENT_PAYLOAD_MAX + 1];
//! assert!(EventRecord::new(8, EventLevel::Error, &too_big).is_err());
//! ```

mod event;
mod level;

pub use event::{EVENT_PAYLOAD_MAX, EventRecord};
pub use level::EventLevel;
