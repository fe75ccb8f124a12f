//! Background agent that drains a ring into a sink
//!
//! The agent owns one worker thread. The worker sleeps on a coalescing wakeup until
//! a producer calls [`notify`](TelemetryAgent::notify), then forwards queued events
//! to the sink in FIFO order. At most `max_drain_per_wake` events are forwarded per
//! batch; between batches the worker checks the stop flag and keeps draining
//! without sleeping again while events remain.
//!
//! The worker runs on a [`std::thread::Scope`], so the ring and the sink must
//! outlive the agent:
//!
//! ```rust
//! use sensorlink::{CountingSink, EventLevel, EventRecord, RingBuffer, TelemetryAgent};
//!
//! let mut ring = RingBuffer::new(64).unwrap();
//! let mut sink = CountingSink::new();
//! let (mut producer, consumer) = ring.split();
//!
//! let stats = std::thread::scope(|scope| {
//!     let agent = TelemetryAgent::start(scope, consumer, &mut sink).unwrap();
//!     producer.push(EventRecord::new(7, EventLevel::Info, b"boot").unwrap());
//!     agent.notify();
//!     agent.stop()
//! });
//!
//! assert_eq!(stats.sent, 1);
//! assert!(sink.was_shut_down());
//! ```
//!
//! Events pushed before `stop` is called are delivered by the final drain. Events
//! pushed concurrently with or after `stop` may stay in the ring.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{Builder, Scope, ScopedJoinHandle};

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use crate::config::AgentConfig;
use crate::ring::Consumer;
use crate::sink::Sink;
use crate::wakeup::Wakeup;
use crate::{Result, TelemetryError};

/// Snapshot of an agent's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// Events the sink accepted.
    pub sent: u64,
    /// Calls to `notify`, from the agent or any of its notifiers.
    pub wakeups: u64,
    /// Events the sink rejected. These are discarded.
    pub send_failures: u64,
}

/// Live counters shared between an agent, its worker and its notifiers.
#[derive(Debug, Default)]
pub struct AgentCounters {
    sent: AtomicU64,
    wakeups: AtomicU64,
    send_failures: AtomicU64,
}

impl AgentCounters {
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn wakeup_count(&self) -> u64 {
        self.wakeups.load(Ordering::Relaxed)
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> AgentStats {
        AgentStats {
            sent: self.sent_count(),
            wakeups: self.wakeup_count(),
            send_failures: self.send_failures(),
        }
    }
}

/// Sent count of an optional agent, `0` when absent.
pub fn sent_count(counters: Option<&AgentCounters>) -> u64 {
    counters.map_or(0, AgentCounters::sent_count)
}

/// Wakeup count of an optional agent, `0` when absent.
pub fn wakeup_count(counters: Option<&AgentCounters>) -> u64 {
    counters.map_or(0, AgentCounters::wakeup_count)
}

#[derive(Debug, Default)]
struct AgentShared {
    wakeup: Wakeup,
    stop: AtomicBool,
    counters: AgentCounters,
}

impl AgentShared {
    fn notify(&self) {
        self.counters.wakeups.fetch_add(1, Ordering::Relaxed);
        self.wakeup.signal();
    }
}

/// Cloneable handle that wakes an agent from any thread.
#[derive(Debug, Clone)]
pub struct Notifier {
    shared: Arc<AgentShared>,
}

impl Notifier {
    /// Same as [`TelemetryAgent::notify`].
    pub fn notify(&self) {
        self.shared.notify();
    }

    pub fn counters(&self) -> &AgentCounters {
        &self.shared.counters
    }
}

/// Handle to a running drain worker.
///
/// Dropping the handle performs the same teardown as [`stop`](Self::stop).
pub struct TelemetryAgent<'scope, 'env, S: Sink> {
    shared: Arc<AgentShared>,
    worker: Option<ScopedJoinHandle<'scope, &'env mut S>>,
}

impl<'scope, 'env, S: Sink> TelemetryAgent<'scope, 'env, S> {
    /// Start a worker with the default [`AgentConfig`].
    ///
    /// The sink should already be initialized; the agent only calls `send` and,
    /// on teardown, `shutdown`.
    pub fn start(
        scope: &'scope Scope<'scope, 'env>,
        consumer: Consumer<'env>,
        sink: &'env mut S,
    ) -> Result<Self> {
        Self::start_with_config(scope, consumer, sink, &AgentConfig::default())
    }

    /// Start a worker with an explicit configuration.
    ///
    /// Fails with `InvalidArgument` for an invalid configuration and with
    /// `ThreadOrSyncCreationFailure` when the worker thread cannot be spawned.
    pub fn start_with_config(
        scope: &'scope Scope<'scope, 'env>,
        consumer: Consumer<'env>,
        sink: &'env mut S,
        config: &AgentConfig,
    ) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(AgentShared::default());
        let worker_shared = Arc::clone(&shared);
        let max_drain_per_wake = config.max_drain_per_wake;

        let worker = Builder::new()
            .name(config.thread_name.clone())
            .spawn_scoped(scope, move || {
                let mut consumer = consumer;
                drain_loop(&worker_shared, &mut consumer, &mut *sink, max_drain_per_wake);
                sink
            })
            .map_err(|source| TelemetryError::ThreadOrSyncCreationFailure {
                what: format!("worker thread '{}'", config.thread_name),
                source,
            })?;

        info!(
            thread = %config.thread_name,
            max_drain_per_wake,
            "Telemetry agent started"
        );

        Ok(Self { shared, worker: Some(worker) })
    }

    /// Wake the worker. Never blocks on the worker; repeated calls before it runs
    /// coalesce into one drain.
    pub fn notify(&self) {
        self.shared.notify();
    }

    /// Handle for waking this agent from other threads.
    pub fn notifier(&self) -> Notifier {
        Notifier { shared: Arc::clone(&self.shared) }
    }

    pub fn sent_count(&self) -> u64 {
        self.shared.counters.sent_count()
    }

    pub fn wakeup_count(&self) -> u64 {
        self.shared.counters.wakeup_count()
    }

    pub fn send_failures(&self) -> u64 {
        self.shared.counters.send_failures()
    }

    pub fn stats(&self) -> AgentStats {
        self.shared.counters.snapshot()
    }

    pub fn counters(&self) -> &AgentCounters {
        &self.shared.counters
    }

    /// Stop the worker after a final drain, shut the sink down and return the
    /// final counters.
    pub fn stop(mut self) -> AgentStats {
        self.shutdown_worker();
        self.stats()
    }

    fn shutdown_worker(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        self.shared.stop.store(true, Ordering::Release);
        self.shared.wakeup.signal();

        match worker.join() {
            Ok(sink) => sink.shutdown(),
            Err(_) => error!("Telemetry agent worker panicked; sink was not shut down"),
        }

        let stats = self.stats();
        if stats.send_failures > 0 {
            warn!(failures = stats.send_failures, "Telemetry agent discarded events after send failures");
        }
        info!(sent = stats.sent, wakeups = stats.wakeups, "Telemetry agent stopped");
    }
}

impl<S: Sink> Drop for TelemetryAgent<'_, '_, S> {
    fn drop(&mut self) {
        self.shutdown_worker();
    }
}

impl<S: Sink> std::fmt::Debug for TelemetryAgent<'_, '_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryAgent")
            .field("running", &self.worker.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

fn drain_loop<S: Sink + ?Sized>(
    shared: &AgentShared,
    consumer: &mut Consumer<'_>,
    sink: &mut S,
    max_drain_per_wake: usize,
) {
    debug!("Drain worker running");

    loop {
        shared.wakeup.wait();
        trace!(queued = consumer.count(), "Drain worker woke");

        loop {
            let emptied = drain_batch(shared, consumer, sink, Some(max_drain_per_wake));

            if shared.stop.load(Ordering::Acquire) {
                drain_batch(shared, consumer, sink, None);
                debug!(dropped = consumer.dropped(), "Drain worker exiting");
                return;
            }

            if emptied {
                break;
            }
        }
    }
}

/// Forward up to `limit` events. Returns `true` once the ring was seen empty.
fn drain_batch<S: Sink + ?Sized>(
    shared: &AgentShared,
    consumer: &mut Consumer<'_>,
    sink: &mut S,
    limit: Option<usize>,
) -> bool {
    let mut forwarded = 0usize;

    while limit.is_none_or(|limit| forwarded < limit) {
        let Some(event) = consumer.pop() else {
            return true;
        };
        forwarded += 1;

        match sink.send(&event) {
            Ok(()) => {
                shared.counters.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                shared.counters.send_failures.fetch_add(1, Ordering::Relaxed);
                debug!(event_id = event.event_id(), error = %e, "Sink rejected event");
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{event, wait_until};
    use crate::{CountingSink, ErrorKind, RingBuffer};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn delivers_queued_events_on_single_notify() {
        let mut ring = RingBuffer::new(1024).unwrap();
        let mut sink = CountingSink::recording();
        let (mut producer, consumer) = ring.split();

        let stats = thread::scope(|scope| {
            let agent = TelemetryAgent::start(scope, consumer, &mut sink).unwrap();
            for id in 0..10 {
                assert!(producer.push(event(id)));
            }
            agent.notify();
            agent.stop()
        });

        assert_eq!(stats, AgentStats { sent: 10, wakeups: 1, send_failures: 0 });
        assert!(sink.was_shut_down());
        let ids: Vec<u32> = sink.events().iter().map(|e| e.event_id()).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn stop_without_notify_still_drains() {
        let mut ring = RingBuffer::new(16).unwrap();
        let mut sink = CountingSink::new();
        let (mut producer, consumer) = ring.split();

        let stats = thread::scope(|scope| {
            let agent = TelemetryAgent::start(scope, consumer, &mut sink).unwrap();
            for id in 0..5 {
                producer.push(event(id));
            }
            agent.stop()
        });

        assert_eq!(stats.sent, 5);
        assert_eq!(stats.wakeups, 0);
    }

    #[test]
    fn small_cap_continues_without_new_notify() {
        let mut ring = RingBuffer::new(256).unwrap();
        let mut sink = CountingSink::new();
        let (mut producer, consumer) = ring.split();
        let config = AgentConfig { max_drain_per_wake: 1, ..AgentConfig::default() };

        thread::scope(|scope| {
            let agent = TelemetryAgent::start_with_config(scope, consumer, &mut sink, &config)
                .unwrap();
            for id in 0..100 {
                assert!(producer.push(event(id)));
            }
            agent.notify();

            assert!(wait_until(Duration::from_secs(5), || agent.sent_count() == 100));
            assert_eq!(agent.wakeup_count(), 1);
            agent.stop();
        });

        assert_eq!(sink.count(), 100);
    }

    #[test]
    fn send_failures_are_counted_and_discarded() {
        let mut ring = RingBuffer::new(32).unwrap();
        let mut sink = CountingSink::recording().failing_every(2);
        let (mut producer, consumer) = ring.split();

        let stats = thread::scope(|scope| {
            let agent = TelemetryAgent::start(scope, consumer, &mut sink).unwrap();
            for id in 0..10 {
                producer.push(event(id));
            }
            agent.notify();
            agent.stop()
        });

        assert_eq!(stats.sent, 5);
        assert_eq!(stats.send_failures, 5);
        assert_eq!(sink.attempts(), 10);
        let ids: Vec<u32> = sink.events().iter().map(|e| e.event_id()).collect();
        assert_eq!(ids, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn notifier_wakes_agent_from_producer_thread() {
        let mut ring = RingBuffer::new(2048).unwrap();
        let mut sink = CountingSink::recording();
        let (mut producer, consumer) = ring.split();

        let stats = thread::scope(|scope| {
            let agent = TelemetryAgent::start(scope, consumer, &mut sink).unwrap();
            let notifier = agent.notifier();

            let producer_thread = scope.spawn(move || {
                for id in 0..1000 {
                    assert!(producer.push(event(id)));
                    notifier.notify();
                }
            });
            producer_thread.join().unwrap();

            agent.stop()
        });

        assert_eq!(stats.sent, 1000);
        assert_eq!(stats.wakeups, 1000);
        assert!(sink.events().windows(2).all(|w| w[0].event_id() < w[1].event_id()));
    }

    #[test]
    fn dropping_agent_tears_down() {
        let mut ring = RingBuffer::new(8).unwrap();
        let mut sink = CountingSink::new();
        let (mut producer, consumer) = ring.split();

        thread::scope(|scope| {
            let agent = TelemetryAgent::start(scope, consumer, &mut sink).unwrap();
            producer.push(event(1));
            drop(agent);
        });

        assert_eq!(sink.count(), 1);
        assert!(sink.was_shut_down());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut ring = RingBuffer::new(8).unwrap();
        let mut sink = CountingSink::new();
        let (_producer, consumer) = ring.split();
        let config = AgentConfig { max_drain_per_wake: 0, ..AgentConfig::default() };

        thread::scope(|scope| {
            let err = TelemetryAgent::start_with_config(scope, consumer, &mut sink, &config)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        });

        assert!(!sink.was_shut_down());
    }

    #[test]
    fn worker_thread_carries_configured_name() {
        struct NameSink(Option<String>);
        impl Sink for NameSink {
            fn init(&mut self, _: &crate::SinkConfig) -> Result<()> {
                Ok(())
            }
            fn send(&mut self, _: &crate::EventRecord) -> Result<()> {
                self.0 = thread::current().name().map(str::to_string);
                Ok(())
            }
            fn shutdown(&mut self) {}
        }

        let mut ring = RingBuffer::new(4).unwrap();
        let mut sink = NameSink(None);
        let (mut producer, consumer) = ring.split();
        let config = AgentConfig { thread_name: "sensor-drain".to_string(), ..AgentConfig::default() };

        thread::scope(|scope| {
            let agent = TelemetryAgent::start_with_config(scope, consumer, &mut sink, &config)
                .unwrap();
            producer.push(event(1));
            agent.stop();
        });

        assert_eq!(sink.0.as_deref(), Some("sensor-drain"));
    }

    #[test]
    fn absent_agent_reports_zero() {
        assert_eq!(sent_count(None), 0);
        assert_eq!(wakeup_count(None), 0);

        let counters = AgentCounters::default();
        counters.sent.fetch_add(3, Ordering::Relaxed);
        assert_eq!(sent_count(Some(&counters)), 3);
        assert_eq!(wakeup_count(Some(&counters)), 0);
    }

    #[test]
    fn counters_outlive_stopped_agent_through_notifier() {
        let mut ring = RingBuffer::new(8).unwrap();
        let mut sink = CountingSink::new();
        let (mut producer, consumer) = ring.split();

        let notifier = thread::scope(|scope| {
            let agent = TelemetryAgent::start(scope, consumer, &mut sink).unwrap();
            let notifier = agent.notifier();
            producer.push(event(1));
            notifier.notify();
            agent.stop();
            notifier
        });

        assert_eq!(sent_count(Some(notifier.counters())), 1);
        assert_eq!(wakeup_count(Some(notifier.counters())), 1);
    }
}
