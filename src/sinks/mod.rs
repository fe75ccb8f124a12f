//! Built-in sink implementations.

mod counting;
mod udp;

pub use counting::CountingSink;
pub use udp::UdpSink;
