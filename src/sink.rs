//! Sink trait for event destinations

use crate::config::SinkConfig;
use crate::{EventRecord, Result};

/// Destination for drained events.
///
/// A sink is driven from the agent's worker thread only, so implementations need
/// `Send` but not `Sync`. The agent treats each `send` as all-or-nothing: an `Err`
/// means the event was not delivered and it is discarded without retry.
pub trait Sink: Send {
    /// Prepare the sink for sending (open sockets, resolve endpoints).
    fn init(&mut self, config: &SinkConfig) -> Result<()>;

    /// Deliver one event.
    fn send(&mut self, event: &EventRecord) -> Result<()>;

    /// Release resources. Called once by the agent after its worker has exited.
    fn shutdown(&mut self);
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn init(&mut self, config: &SinkConfig) -> Result<()> {
        (**self).init(config)
    }

    fn send(&mut self, event: &EventRecord) -> Result<()> {
        (**self).send(event)
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}
