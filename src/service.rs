//! Timer service: registration, control, tick and dispatch.
//!
//! The `TimerService` owns the timer pool and the event queue. It is built in a
//! `const` context so it can live in a `static` shared by the tick interrupt
//! and the main loop.
//!
//! # Integration
//!
//! ```rust,ignore
//! static TIMERS: DefaultTimerService = TimerService::new();
//!
//! #[exception]
//! fn SysTick() {
//!     TIMERS.tick_1ms();
//! }
//!
//! fn main() -> ! {
//!     let id = TIMERS.create_timer(10, poll_sensors, 0).unwrap();
//!     TIMERS.start_timer(id).ok();
//!     loop {
//!         TIMERS.dispatch();
//!     }
//! }
//! ```
//!
//! # Contexts
//!
//! - [`TimerService::tick_1ms`] runs in interrupt context, once per millisecond.
//!   It never runs callbacks.
//! - [`TimerService::dispatch`] runs in the main loop. All callbacks run here.
//! - Control calls run in the main loop inside a critical section, so they
//!   never interleave with a tick.

use crate::error::TimerError;
use crate::queue::{Event, EventQueue, QueueStats};
use crate::timer::{
    Fired, SlotState, Task, TimerCallback, TimerId, TimerInfo, TimerKind, TimerSlot,
};
use crate::{log_debug, log_trace, log_warn};

/// Counts from one dispatch pass.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchReport {
    /// Queue-kind callbacks invoked
    pub queued: usize,
    /// Flag-kind callbacks invoked
    pub flagged: usize,
    /// Queue entries skipped because their slot was released after the push
    pub skipped: usize,
}

impl DispatchReport {
    /// Total callbacks invoked during the pass.
    pub fn invoked(&self) -> usize {
        self.queued + self.flagged
    }
}

/// Fixed-capacity cooperative timer service.
///
/// Generic over:
/// - `N`: number of timer slots (default 16)
/// - `M`: event queue capacity (default 16)
#[derive(Debug)]
pub struct TimerService<const N: usize = 16, const M: usize = 16> {
    slots: [TimerSlot; N],
    queue: EventQueue<M>,
}

impl<const N: usize, const M: usize> TimerService<N, M> {
    /// Number of timer slots.
    pub const MAX_TIMERS: usize = N;

    /// Event queue capacity.
    pub const QUEUE_SIZE: usize = M;

    const CAPACITY_CHECK: () = {
        assert!(N > 0, "timer pool needs at least one slot");
        assert!(M > 0, "event queue needs at least one entry");
        assert!(N - 1 <= Event::MAX_INDEX, "timer pool too large for queue entries");
    };

    /// Create a service with every slot free and an empty queue.
    pub const fn new() -> Self {
        let () = Self::CAPACITY_CHECK;

        Self {
            slots: [const { TimerSlot::new() }; N],
            queue: EventQueue::new(),
        }
    }

    /// Free every slot and empty the event queue.
    ///
    /// The queue statistics are kept; use
    /// [`clear_queue_stats`](Self::clear_queue_stats) to reset them.
    pub fn init(&self) {
        critical_section::with(|cs| {
            for slot in &self.slots {
                slot.release(cs);
            }
            self.queue.reset();
        });
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Claim the first free slot for a timer of the given kind.
    ///
    /// The timer is left stopped; call [`start_timer`](Self::start_timer) to
    /// arm it. `context` is passed to `callback` on every invocation.
    ///
    /// # Errors
    ///
    /// [`TimerError::NoFreeSlot`] when every slot is claimed.
    pub fn create(
        &self,
        period_ms: u16,
        kind: TimerKind,
        callback: TimerCallback,
        context: usize,
    ) -> Result<TimerId, TimerError> {
        let claimed = critical_section::with(|cs| {
            let (index, slot) = self.slots.iter().enumerate().find(|(_, s)| s.is_free())?;
            slot.claim(cs, period_ms, kind, Task { callback, context });
            Some(TimerId::new(index))
        });

        match claimed {
            Some(id) => {
                log_debug!("timer {} claimed, period {} ms", id.index(), period_ms);
                Ok(id)
            }
            None => {
                log_warn!("timer pool full ({} slots)", N);
                Err(TimerError::NoFreeSlot)
            }
        }
    }

    /// Create a queue-kind timer (the default kind).
    pub fn create_timer(
        &self,
        period_ms: u16,
        callback: TimerCallback,
        context: usize,
    ) -> Result<TimerId, TimerError> {
        self.create_timer_queue(period_ms, callback, context)
    }

    /// Create a queue-kind timer: every firing is queued and dispatched in
    /// firing order.
    pub fn create_timer_queue(
        &self,
        period_ms: u16,
        callback: TimerCallback,
        context: usize,
    ) -> Result<TimerId, TimerError> {
        self.create(period_ms, TimerKind::Queue, callback, context)
    }

    /// Create a flag-kind timer: firings between two dispatch passes coalesce
    /// into one callback. Suited to short periods.
    pub fn create_timer_flag(
        &self,
        period_ms: u16,
        callback: TimerCallback,
        context: usize,
    ) -> Result<TimerId, TimerError> {
        self.create(period_ms, TimerKind::Flag, callback, context)
    }

    /// Free a claimed slot so a later create call can reuse it.
    ///
    /// Queue entries already pushed for this timer are skipped by dispatch,
    /// even if a later create call reuses the slot first.
    pub fn destroy_timer(&self, id: TimerId) -> Result<(), TimerError> {
        self.with_claimed(id, |cs, slot| slot.release(cs))?;
        log_debug!("timer {} released", id.index());
        Ok(())
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Arm a timer. Restarts its period from now and drops any pending flag.
    pub fn start_timer(&self, id: TimerId) -> Result<(), TimerError> {
        self.with_claimed(id, |_, slot| slot.start())
    }

    /// Disarm a timer and drop any pending flag.
    ///
    /// Queue entries already pushed for this timer are not retracted and still
    /// run on the next dispatch pass.
    pub fn stop_timer(&self, id: TimerId) -> Result<(), TimerError> {
        self.with_claimed(id, |_, slot| slot.stop())
    }

    /// Change a timer's period without resetting its elapsed time.
    ///
    /// If the new period is not above the elapsed time, the timer fires on the
    /// next tick.
    pub fn change_period(&self, id: TimerId, period_ms: u16) -> Result<(), TimerError> {
        self.with_claimed(id, |_, slot| slot.set_period(period_ms))
    }

    fn with_claimed<F>(&self, id: TimerId, f: F) -> Result<(), TimerError>
    where
        F: FnOnce(critical_section::CriticalSection<'_>, &TimerSlot),
    {
        let slot = self.slots.get(id.index()).ok_or(TimerError::InvalidId)?;

        critical_section::with(|cs| {
            if slot.is_free() {
                return Err(TimerError::InvalidId);
            }
            f(cs, slot);
            Ok(())
        })
    }

    // ========================================================================
    // Tick and dispatch
    // ========================================================================

    /// Advance every active timer by one millisecond.
    ///
    /// Call once per millisecond from the tick interrupt. Bounded by `N`,
    /// never blocks and never runs callbacks.
    pub fn tick_1ms(&self) {
        critical_section::with(|_| {
            for (index, slot) in self.slots.iter().enumerate() {
                if slot.advance() != Fired::Queue {
                    continue;
                }
                let event = Event {
                    id: TimerId::new(index),
                    generation: slot.generation(),
                };
                if !self.queue.push(event) {
                    log_trace!(
                        "timer {} firing dropped: {}",
                        index,
                        TimerError::QueueOverflow
                    );
                }
            }
        });
    }

    /// Run due callbacks. Call repeatedly from the main loop.
    ///
    /// Drains the whole event queue first, running queue-kind callbacks in
    /// firing order. Then sweeps the pool once in slot order and runs each
    /// pending flag-kind callback, at most once per pass.
    pub fn dispatch(&self) -> DispatchReport {
        let mut report = DispatchReport::default();

        while let Some(Event { id, generation }) = self.queue.pop() {
            let task = self
                .slots
                .get(id.index())
                .and_then(|slot| slot.queued_task(generation));

            match task {
                Some(task) => {
                    task.run();
                    report.queued += 1;
                }
                None => {
                    log_debug!("stale event for timer {} skipped", id.index());
                    report.skipped += 1;
                }
            }
        }

        for slot in &self.slots {
            if let Some(task) = slot.take_pending() {
                task.run();
                report.flagged += 1;
            }
        }

        report
    }

    // ========================================================================
    // Statistics and introspection
    // ========================================================================

    /// High-water mark of event queue occupancy.
    pub fn queue_max_used(&self) -> usize {
        self.queue.max_used()
    }

    /// Number of queue-kind firings dropped on a full queue.
    pub fn queue_overflow_count(&self) -> u32 {
        self.queue.overflow_count()
    }

    /// Reset the high-water mark and the overflow counter.
    pub fn clear_queue_stats(&self) {
        critical_section::with(|_| self.queue.clear_stats());
    }

    /// Current event queue occupancy.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// All queue statistics at once.
    pub fn queue_stats(&self) -> QueueStats {
        critical_section::with(|_| self.queue.stats())
    }

    /// View of one claimed slot, `None` for free or out-of-range ids.
    pub fn timer_info(&self, id: TimerId) -> Option<TimerInfo> {
        self.slots.get(id.index())?.info(id)
    }

    /// Views of every claimed slot, in slot order.
    pub fn timers(&self) -> heapless::Vec<TimerInfo, N> {
        let mut infos = heapless::Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(info) = slot.info(TimerId::new(index)) {
                // Capacity equals the pool size
                let _ = infos.push(info);
            }
        }
        infos
    }

    /// Number of claimed slots.
    pub fn claimed_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_free()).count()
    }

    /// Number of active timers.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state() == SlotState::Active)
            .count()
    }
}

impl<const N: usize, const M: usize> Default for TimerService<N, M> {
    fn default() -> Self {
        Self::new()
    }
}
