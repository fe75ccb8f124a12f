//! Coalescing wakeup signal for the agent worker

use parking_lot::{Condvar, Mutex};

/// Pending flag plus condition variable.
///
/// Any number of [`signal`](Wakeup::signal) calls made while nobody waits collapse
/// into a single pending wake, which the next [`wait`](Wakeup::wait) consumes.
#[derive(Debug, Default)]
pub(crate) struct Wakeup {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl Wakeup {
    /// Mark a wake as pending and wake the waiter, if any. Never blocks on the waiter.
    pub(crate) fn signal(&self) {
        let mut pending = self.pending.lock();
        *pending = true;
        self.cond.notify_one();
    }

    /// Block until a wake is pending, then consume it.
    pub(crate) fn wait(&self) {
        let mut pending = self.pending.lock();
        while !*pending {
            self.cond.wait(&mut pending);
        }
        *pending = false;
    }

    #[cfg(test)]
    fn is_pending(&self) -> bool {
        *self.pending.lock()
    }
}
