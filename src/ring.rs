//! Lock-free SPSC event queue with drop-on-overflow backpressure.
//!
//! # Overview
//! - Single producer, single consumer, enforced by construction: [`RingBuffer::split`]
//!   borrows the ring mutably and hands out exactly one [`Producer`] and one
//!   [`Consumer`], neither of which can be cloned.
//! - `capacity` usable slots are backed by `capacity + 1` physical slots. The spare
//!   slot tells "full" (`next(head) == tail`) apart from "empty" (`head == tail`)
//!   without a shared counter.
//! - The producer never blocks and never overwrites unread data. A push into a full
//!   ring is rejected and counted in `dropped`.
//!
//! # Memory ordering
//! The producer loads its own `head` relaxed and the consumer's `tail` with acquire,
//! writes the slot, then publishes `head` with release. The consumer mirrors this:
//! own `tail` relaxed, `head` acquire, read the slot, publish `tail` with release.
//! A slot is therefore only read after its write is visible, and only rewritten
//! after its read has completed. This pairing is only sound with one producer and
//! one consumer; the handle types make any other arrangement fail to compile.
//!
//! A second split while handles are alive is rejected by the borrow checker:
//!
//! ```compile_fail
//! use sensorlink::RingBuffer;
//!
//! let mut ring = RingBuffer::new(4).unwrap();
//! let (producer, consumer) = ring.split();
//! let (second_producer, _) = ring.split();
//! drop((producer, consumer, second_producer));
//! ```
//!
//! and so is duplicating a handle:
//!
//! ```compile_fail
//! use sensorlink::{Producer, RingBuffer};
//!
//! let mut ring = RingBuffer::new(4).unwrap();
//! let (producer, _consumer) = ring.split();
//! let other: Producer<'_> = producer.clone();
//! ```

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::debug;

use crate::{EventRecord, Result, TelemetryError};

/// Fixed-capacity SPSC circular queue of [`EventRecord`].
pub struct RingBuffer {
    slots: Box<[UnsafeCell<EventRecord>]>,
    capacity: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicU64,
}

// Slots are only touched through the single Producer / Consumer pair, and every
// hand-over goes through the release/acquire publication of head and tail.
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Allocate a ring with `capacity` usable slots.
    ///
    /// Fails with `InvalidArgument` for a zero capacity and `AllocationFailure`
    /// when the slot storage cannot be reserved.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TelemetryError::invalid_argument("ring capacity must be non-zero"));
        }
        let allocation = capacity
            .checked_add(1)
            .ok_or_else(|| TelemetryError::invalid_argument("ring capacity overflows usize"))?;

        let mut slots = Vec::new();
        slots.try_reserve_exact(allocation).map_err(|e| TelemetryError::AllocationFailure {
            context: format!("{} ring slots", allocation),
            source: Some(e),
        })?;
        slots.extend((0..allocation).map(|_| UnsafeCell::new(EventRecord::default())));

        debug!(capacity, allocation, "Allocated ring buffer");

        Ok(Self {
            slots: slots.into_boxed_slice(),
            capacity,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    /// Hand out the producer and consumer roles.
    ///
    /// The exclusive borrow keeps a second pair from existing at the same time.
    pub fn split(&mut self) -> (Producer<'_>, Consumer<'_>) {
        let ring: &RingBuffer = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Number of usable slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued records right now.
    pub fn count(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        self.distance(head, tail)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Pushes rejected because the ring was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline(always)]
    fn allocation(&self) -> usize {
        self.slots.len()
    }

    #[inline(always)]
    fn next_index(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.allocation() { 0 } else { next }
    }

    #[inline(always)]
    fn distance(&self, head: usize, tail: usize) -> usize {
        (head + self.allocation() - tail) % self.allocation()
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity)
            .field("count", &self.count())
            .field("dropped", &self.dropped())
            .finish()
    }
}

/// The writing half of a [`RingBuffer`].
pub struct Producer<'a> {
    ring: &'a RingBuffer,
}

impl Producer<'_> {
    /// Enqueue `event`. Returns false and counts a drop when the ring is full.
    #[inline]
    pub fn push(&mut self, event: EventRecord) -> bool {
        self.try_push(event).is_ok()
    }

    /// Enqueue `event`, reporting a full ring as `QueueFull`.
    pub fn try_push(&mut self, event: EventRecord) -> Result<()> {
        let ring = self.ring;
        let head = ring.head.load(Ordering::Relaxed);
        let next = ring.next_index(head);

        if next == ring.tail.load(Ordering::Acquire) {
            ring.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(TelemetryError::QueueFull { capacity: ring.capacity });
        }

        // The consumer never reads slot `head` until the store below publishes it.
        unsafe { *ring.slots[head].get() = event };

        ring.head.store(next, Ordering::Release);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn count(&self) -> usize {
        self.ring.count()
    }

    pub fn dropped(&self) -> u64 {
        self.ring.dropped()
    }
}

/// The reading half of a [`RingBuffer`].
pub struct Consumer<'a> {
    ring: &'a RingBuffer,
}

impl Consumer<'_> {
    /// Dequeue the oldest record, `None` when the ring is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<EventRecord> {
        let ring = self.ring;
        let tail = ring.tail.load(Ordering::Relaxed);

        if tail == ring.head.load(Ordering::Acquire) {
            return None;
        }

        // The producer never rewrites slot `tail` until the store below releases it.
        let event = unsafe { *ring.slots[tail].get() };

        ring.tail.store(ring.next_index(tail), Ordering::Release);
        Some(event)
    }

    /// Dequeue the oldest record, reporting an empty ring as `QueueEmpty`.
    pub fn try_pop(&mut self) -> Result<EventRecord> {
        self.pop().ok_or(TelemetryError::QueueEmpty)
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn count(&self) -> usize {
        self.ring.count()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.ring.dropped()
    }
}
