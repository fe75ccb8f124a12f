//! In-process sink that counts deliveries

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::trace;

use crate::config::SinkConfig;
use crate::sink::Sink;
use crate::{EventRecord, Result, TelemetryError};

/// Sink that counts the events it receives.
///
/// Useful for tests, benchmarks and dry runs. It can keep a copy of every
/// delivered event and can be told to fail every Nth send.
#[derive(Debug, Default)]
pub struct CountingSink {
    sent: AtomicU64,
    attempts: u64,
    fail_every: Option<u64>,
    record: bool,
    events: Vec<EventRecord>,
    initialized: bool,
    shutdown: AtomicBool,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a copy of each delivered event, see [`events`](Self::events).
    pub fn recording() -> Self {
        Self { record: true, ..Self::default() }
    }

    /// Fail every `n`th send attempt (the `n`th, `2n`th, ...). `0` disables failures.
    pub fn failing_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Number of successful sends.
    pub fn count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Number of send attempts, including failed ones.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Delivered events in arrival order. Empty unless built with [`recording`](Self::recording).
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn was_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl Sink for CountingSink {
    fn init(&mut self, _config: &SinkConfig) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn send(&mut self, event: &EventRecord) -> Result<()> {
        self.attempts += 1;

        if self.fail_every.is_some_and(|n| self.attempts % n == 0) {
            return Err(TelemetryError::send_failed(format!(
                "injected failure on attempt {}",
                self.attempts
            )));
        }

        if self.record {
            self.events.push(*event);
        }
        self.sent.fetch_add(1, Ordering::Relaxed);
        trace!(event_id = event.event_id(), "Counted event");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
