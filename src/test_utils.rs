//! Test utilities shared by unit tests and benchmarks
//!
//! Builders for deterministic events and small helpers for waiting on
//! background threads.

#![cfg(any(test, feature = "benchmark"))]

use std::sync::Once;
use std::time::{Duration, Instant};

use crate::{EVENT_PAYLOAD_MAX, EventLevel, EventRecord};

/// Event with the given id, `Info` level, an empty payload and timestamp `id`.
pub fn event(id: u32) -> EventRecord {
    event_with_payload(id, &[])
}

/// Event with the given id and payload, `Info` level and timestamp `id`.
///
/// # Panics
///
/// Panics if `payload` is longer than [`EVENT_PAYLOAD_MAX`].
pub fn event_with_payload(id: u32, payload: &[u8]) -> EventRecord {
    EventRecord::with_timestamp(id, EventLevel::Info, payload, u64::from(id))
        .unwrap_or_else(|e| panic!("invalid test event {id}: {e}"))
}

/// Event carrying a full payload, for sizing benchmarks.
pub fn full_event(id: u32) -> EventRecord {
    let payload: Vec<u8> = (0..EVENT_PAYLOAD_MAX).map(|i| (i as u8).wrapping_add(id as u8)).collect();
    event_with_payload(id, &payload)
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`, defaulting to `warn`.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}
