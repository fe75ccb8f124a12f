//! Monotonic timestamps for event records.
//!
//! Timestamps are nanoseconds since a process-local anchor captured the first time
//! the clock is read. The epoch is unspecified and unrelated to wall-clock time; only
//! differences between two readings are meaningful.

use std::sync::OnceLock;
use std::time::Instant;

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Current monotonic time in nanoseconds.
///
/// Never goes backwards within a process. Saturates at `u64::MAX` (after ~584 years).
pub fn monotonic_ns() -> u64 {
    let anchor = ANCHOR.get_or_init(Instant::now);
    u64::try_from(anchor.elapsed().as_nanos()).unwrap_or(u64::MAX)
}
