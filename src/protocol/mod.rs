//! Wire protocol: the fixed 32-byte header and event batch framing.
//!
//! ```rust
//! use sensorlink::protocol::{MessageType, ProtocolHeader, decode_header, encode_header};
//!
//! let header = ProtocolHeader::new(MessageType::HeartbeatBatch, 42, 1_000, 0);
//! let bytes = encode_header(&header).unwrap();
//! assert_eq!(decode_header(&bytes).unwrap(), header);
//! ```

pub mod frame;
pub mod header;

pub use frame::{
    EVENT_WIRE_PREFIX_LEN, EventFrame, decode_event, decode_event_frame, encode_event,
    encode_event_frame, encoded_event_len,
};
pub use header::{
    HEADER_LEN, MessageType, PROTOCOL_MAGIC, PROTOCOL_VERSION, ProtocolHeader, decode_header,
    encode_header,
};
