//! Error types for timer service operations.
//!
//! None of these conditions halt the system. A failed call simply has no
//! effect, and dropped firings only show up in the queue statistics.

use core::fmt;

/// Timer service error type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Every slot in the pool is claimed
    NoFreeSlot,

    /// Timer id is out of range or names a free slot
    InvalidId,

    /// Event queue was full and a firing was dropped
    ///
    /// Never returned from a call. The tick logs it when it drops a firing,
    /// and the overflow statistic counts it.
    QueueOverflow,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerError::NoFreeSlot => write!(f, "No free timer slot"),
            TimerError::InvalidId => write!(f, "Invalid timer id"),
            TimerError::QueueOverflow => write!(f, "Event queue overflow"),
        }
    }
}
