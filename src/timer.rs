//! Timer slot data model.
//!
//! Each pool slot is shared between the tick interrupt and the main loop, so
//! every field the interrupt touches is an atomic. Only `load`/`store` are used,
//! which keeps the crate usable on cores without atomic read-modify-write.
//!
//! Ownership per field:
//! - `state`, `kind`, `period`: written by the control API, read by the tick
//! - `elapsed`: advanced by the tick, reset by the control API
//! - `pending`: set by the tick, cleared by dispatch and the control API
//! - `task`: written by the control API, read by dispatch (never by the tick)
//! - `generation`: bumped on release, tagged onto queued firings by the tick

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU16, Ordering};
use critical_section::{CriticalSection, Mutex};

/// Callback invoked from dispatch with the timer's stored context value.
pub type TimerCallback = fn(usize);

/// Timer identifier (index of the slot in the pool).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(usize);

impl TimerId {
    /// Build an id from a raw slot index.
    ///
    /// The index is not checked here; control calls reject ids outside the pool.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Slot index in the pool.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<TimerId> for usize {
    fn from(id: TimerId) -> Self {
        id.0
    }
}

/// Dispatch policy, fixed when the timer is created.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerKind {
    /// Firings coalesce into one pending flag, swept in slot order
    Flag = 0,

    /// Each firing pushes one event, dispatched in firing order
    Queue = 1,
}

impl TimerKind {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => TimerKind::Flag,
            _ => TimerKind::Queue,
        }
    }
}

/// Lifecycle state of a pool slot.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// Unclaimed, available to create calls
    Free = 0,

    /// Claimed but stopped
    Configured = 1,

    /// Claimed and advanced on every tick
    Active = 2,
}

impl SlotState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => SlotState::Configured,
            2 => SlotState::Active,
            _ => SlotState::Free,
        }
    }
}

/// Unit of work stored in a claimed slot.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Task {
    pub(crate) callback: TimerCallback,
    pub(crate) context: usize,
}

impl Task {
    pub(crate) fn run(self) {
        (self.callback)(self.context);
    }
}

/// Point-in-time view of one claimed slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerInfo {
    /// Slot identifier
    pub id: TimerId,
    /// Dispatch policy
    pub kind: TimerKind,
    /// Configured or Active
    pub state: SlotState,
    /// Period in milliseconds (0 never fires)
    pub period_ms: u16,
    /// Milliseconds since the last firing or start
    pub elapsed_ms: u16,
    /// Flag-kind firing waiting for dispatch
    pub pending: bool,
}

/// What a tick decided for one slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Fired {
    /// Not due this tick
    No,
    /// Due; the pending flag was set (or already set)
    Flag,
    /// Due; an event must be pushed to the queue
    Queue,
}

/// One slot of the timer pool.
pub(crate) struct TimerSlot {
    state: AtomicU8,
    kind: AtomicU8,
    period_ms: AtomicU16,
    elapsed_ms: AtomicU16,
    pending: AtomicBool,
    generation: AtomicU8,
    task: Mutex<Cell<Option<Task>>>,
}

impl core::fmt::Debug for TimerSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerSlot")
            .field("state", &self.state())
            .field("kind", &self.kind())
            .field("period_ms", &self.period_ms.load(Ordering::Relaxed))
            .field("elapsed_ms", &self.elapsed_ms.load(Ordering::Relaxed))
            .field("pending", &self.is_pending())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl TimerSlot {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(SlotState::Free as u8),
            kind: AtomicU8::new(TimerKind::Queue as u8),
            period_ms: AtomicU16::new(0),
            elapsed_ms: AtomicU16::new(0),
            pending: AtomicBool::new(false),
            generation: AtomicU8::new(0),
            task: Mutex::new(Cell::new(None)),
        }
    }

    pub(crate) fn state(&self) -> SlotState {
        SlotState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn is_free(&self) -> bool {
        self.state() == SlotState::Free
    }

    pub(crate) fn kind(&self) -> TimerKind {
        TimerKind::from_raw(self.kind.load(Ordering::Relaxed))
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Release count, wrapping at 256.
    pub(crate) fn generation(&self) -> u8 {
        self.generation.load(Ordering::Acquire)
    }

    /// Claim a free slot. Leaves it stopped.
    pub(crate) fn claim(
        &self,
        cs: CriticalSection<'_>,
        period_ms: u16,
        kind: TimerKind,
        task: Task,
    ) {
        self.task.borrow(cs).set(Some(task));
        self.period_ms.store(period_ms, Ordering::Relaxed);
        self.elapsed_ms.store(0, Ordering::Relaxed);
        self.pending.store(false, Ordering::Relaxed);
        self.kind.store(kind as u8, Ordering::Relaxed);
        // Publishes the fields above to the tick path.
        self.state.store(SlotState::Configured as u8, Ordering::Release);
    }

    /// Return the slot to the free pool.
    ///
    /// Bumps the generation so firings queued for the old owner are dropped.
    pub(crate) fn release(&self, cs: CriticalSection<'_>) {
        let generation = self.generation.load(Ordering::Relaxed).wrapping_add(1);
        self.generation.store(generation, Ordering::Release);
        self.state.store(SlotState::Free as u8, Ordering::Release);
        self.pending.store(false, Ordering::Relaxed);
        self.elapsed_ms.store(0, Ordering::Relaxed);
        self.period_ms.store(0, Ordering::Relaxed);
        self.kind.store(TimerKind::Queue as u8, Ordering::Relaxed);
        self.task.borrow(cs).set(None);
    }

    pub(crate) fn start(&self) {
        self.elapsed_ms.store(0, Ordering::Relaxed);
        self.pending.store(false, Ordering::Relaxed);
        self.state.store(SlotState::Active as u8, Ordering::Release);
    }

    pub(crate) fn stop(&self) {
        self.state.store(SlotState::Configured as u8, Ordering::Release);
        self.pending.store(false, Ordering::Release);
    }

    pub(crate) fn set_period(&self, period_ms: u16) {
        self.period_ms.store(period_ms, Ordering::Relaxed);
    }

    /// Advance one millisecond. Tick context only.
    pub(crate) fn advance(&self) -> Fired {
        if self.state() != SlotState::Active {
            return Fired::No;
        }

        let elapsed = self.elapsed_ms.load(Ordering::Relaxed).saturating_add(1);
        let period = self.period_ms.load(Ordering::Relaxed);

        if period == 0 || elapsed < period {
            self.elapsed_ms.store(elapsed, Ordering::Relaxed);
            return Fired::No;
        }

        self.elapsed_ms.store(0, Ordering::Relaxed);

        match self.kind() {
            TimerKind::Flag => {
                if !self.pending.load(Ordering::Relaxed) {
                    self.pending.store(true, Ordering::Release);
                }
                Fired::Flag
            }
            TimerKind::Queue => Fired::Queue,
        }
    }

    /// Consume a pending flag-kind firing. Dispatch context only.
    ///
    /// Pending is cleared before the task is handed out, so a firing during
    /// the callback is kept for the next dispatch pass.
    pub(crate) fn take_pending(&self) -> Option<Task> {
        if self.kind() != TimerKind::Flag
            || self.state() != SlotState::Active
            || !self.pending.load(Ordering::Acquire)
        {
            return None;
        }

        self.pending.store(false, Ordering::Release);
        self.task()
    }

    /// Task of a claimed slot, `None` once the slot is free.
    pub(crate) fn task(&self) -> Option<Task> {
        if self.is_free() {
            return None;
        }
        critical_section::with(|cs| self.task.borrow(cs).get())
    }

    /// Task for a firing queued at `generation`, `None` if the slot has been
    /// released since.
    pub(crate) fn queued_task(&self, generation: u8) -> Option<Task> {
        critical_section::with(|cs| {
            if self.is_free() || self.generation() != generation {
                return None;
            }
            self.task.borrow(cs).get()
        })
    }

    pub(crate) fn info(&self, id: TimerId) -> Option<TimerInfo> {
        let state = self.state();
        if state == SlotState::Free {
            return None;
        }

        Some(TimerInfo {
            id,
            kind: self.kind(),
            state,
            period_ms: self.period_ms.load(Ordering::Relaxed),
            elapsed_ms: self.elapsed_ms.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
        })
    }
}
