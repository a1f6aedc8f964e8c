//! Event queue for queue-kind timer firings.
//!
//! Single-producer/single-consumer ring of timer firings. The tick interrupt is
//! the only producer and dispatch is the only consumer.
//!
//! Each entry packs the slot index with the slot generation at push time, so a
//! firing queued before a destroy never reaches the slot's next owner.
//!
//! Both cursors run over `0..2M` instead of `0..M`:
//! - `tail` counts pushes and is written only by the producer
//! - `head` counts pops and is written only by the consumer
//!
//! Occupancy is `(tail - head) mod 2M`, so empty and full never look alike
//! and no field is written from both contexts. Entry position is `cursor % M`.

#![cfg_attr(not(feature = "stats"), allow(unused_variables))]

#[cfg(feature = "stats")]
use core::sync::atomic::AtomicU32;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::timer::TimerId;

/// One queued firing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Event {
    pub(crate) id: TimerId,
    pub(crate) generation: u8,
}

impl Event {
    const GENERATION_SHIFT: u32 = usize::BITS - 8;
    const INDEX_MASK: usize = (1 << Self::GENERATION_SHIFT) - 1;

    /// Largest slot index an entry can carry.
    pub(crate) const MAX_INDEX: usize = Self::INDEX_MASK;

    fn pack(self) -> usize {
        ((self.generation as usize) << Self::GENERATION_SHIFT)
            | (self.id.index() & Self::INDEX_MASK)
    }

    fn unpack(raw: usize) -> Self {
        Self {
            id: TimerId::new(raw & Self::INDEX_MASK),
            generation: (raw >> Self::GENERATION_SHIFT) as u8,
        }
    }
}

/// Snapshot of the event queue statistics.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueStats {
    /// High-water mark of queue occupancy
    pub max_used: usize,
    /// Firings dropped because the queue was full
    pub overflow_count: u32,
    /// Current occupancy
    pub len: usize,
}

/// Capacity-tuning counters.
///
/// When the `stats` feature is enabled, tracks high-water mark and overflows.
/// When disabled, zero-size stub that no-ops all operations.
#[derive(Debug)]
struct StatsTracker {
    #[cfg(feature = "stats")]
    max_used: AtomicUsize,

    #[cfg(feature = "stats")]
    overflow_count: AtomicU32,
}

impl StatsTracker {
    #[cfg(feature = "stats")]
    const fn new() -> Self {
        Self {
            max_used: AtomicUsize::new(0),
            overflow_count: AtomicU32::new(0),
        }
    }

    #[cfg(not(feature = "stats"))]
    const fn new() -> Self {
        Self {}
    }

    /// Producer side only.
    #[cfg(feature = "stats")]
    fn record_push(&self, len: usize) {
        if len > self.max_used.load(Ordering::Relaxed) {
            self.max_used.store(len, Ordering::Relaxed);
        }
    }

    #[cfg(not(feature = "stats"))]
    fn record_push(&self, len: usize) {}

    /// Producer side only. Saturates instead of wrapping.
    #[cfg(feature = "stats")]
    fn record_overflow(&self) {
        let count = self.overflow_count.load(Ordering::Relaxed);
        self.overflow_count
            .store(count.saturating_add(1), Ordering::Relaxed);
    }

    #[cfg(not(feature = "stats"))]
    fn record_overflow(&self) {}

    #[cfg(feature = "stats")]
    fn max_used(&self) -> usize {
        self.max_used.load(Ordering::Relaxed)
    }

    #[cfg(not(feature = "stats"))]
    fn max_used(&self) -> usize {
        0
    }

    #[cfg(feature = "stats")]
    fn overflow_count(&self) -> u32 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    #[cfg(not(feature = "stats"))]
    fn overflow_count(&self) -> u32 {
        0
    }

    /// Must not race the producer (run with the tick masked).
    #[cfg(feature = "stats")]
    fn clear(&self) {
        self.max_used.store(0, Ordering::Relaxed);
        self.overflow_count.store(0, Ordering::Relaxed);
    }

    #[cfg(not(feature = "stats"))]
    fn clear(&self) {}
}

/// Fixed-capacity ring of pending queue-kind firings.
#[derive(Debug)]
pub(crate) struct EventQueue<const M: usize> {
    entries: [AtomicUsize; M],
    head: AtomicUsize,
    tail: AtomicUsize,
    stats: StatsTracker,
}

impl<const M: usize> EventQueue<M> {
    const WRAP: usize = 2 * M;

    fn advance(cursor: usize) -> usize {
        (cursor + 1) % Self::WRAP
    }

    fn distance(tail: usize, head: usize) -> usize {
        (tail + Self::WRAP - head) % Self::WRAP
    }

    pub(crate) const fn new() -> Self {
        Self {
            entries: [const { AtomicUsize::new(0) }; M],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            stats: StatsTracker::new(),
        }
    }

    /// Current occupancy.
    pub(crate) fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        Self::distance(tail, head)
    }

    /// Push a firing. Producer (tick) context only.
    ///
    /// A full queue drops the event and counts the overflow.
    pub(crate) fn push(&self, event: Event) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let len = Self::distance(tail, head);

        if len >= M {
            self.stats.record_overflow();
            return false;
        }

        self.entries[tail % M].store(event.pack(), Ordering::Relaxed);
        // Publishes the entry before the consumer can see the new tail.
        self.tail.store(Self::advance(tail), Ordering::Release);
        self.stats.record_push(len + 1);
        true
    }

    /// Pop the oldest firing. Consumer (dispatch) context only.
    pub(crate) fn pop(&self) -> Option<Event> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let raw = self.entries[head % M].load(Ordering::Relaxed);
        // Entry is read before the slot is handed back to the producer.
        self.head.store(Self::advance(head), Ordering::Release);
        Some(Event::unpack(raw))
    }

    /// Drop every queued entry and reset the cursors. Statistics are kept.
    ///
    /// Must not race the producer (run with the tick masked).
    pub(crate) fn reset(&self) {
        self.head.store(0, Ordering::Relaxed);
        self.tail.store(0, Ordering::Release);
    }

    pub(crate) fn max_used(&self) -> usize {
        self.stats.max_used()
    }

    pub(crate) fn overflow_count(&self) -> u32 {
        self.stats.overflow_count()
    }

    pub(crate) fn clear_stats(&self) {
        self.stats.clear();
    }

    pub(crate) fn stats(&self) -> QueueStats {
        QueueStats {
            max_used: self.max_used(),
            overflow_count: self.overflow_count(),
            len: self.len(),
        }
    }
}
