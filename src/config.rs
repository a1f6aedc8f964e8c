//! Capacity configuration and service presets.
//!
//! Pool and queue sizes are const generics on [`TimerService`], so all storage
//! is sized at compile time with no runtime cost. The presets below cover the
//! common cases.

use crate::service::TimerService;

/// Default number of timer slots in the pool.
pub const DEFAULT_MAX_TIMERS: usize = 16;

/// Default number of entries in the event queue.
pub const DEFAULT_QUEUE_SIZE: usize = 16;

/// Default service for typical embedded systems.
///
/// - 16 timer slots
/// - 16 event queue entries
pub type DefaultTimerService = TimerService<DEFAULT_MAX_TIMERS, DEFAULT_QUEUE_SIZE>;

/// Minimal service for resource-constrained systems.
///
/// - 4 timer slots
/// - 4 event queue entries
pub type MinimalTimerService = TimerService<4, 4>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preset() {
        assert_eq!(DefaultTimerService::MAX_TIMERS, 16);
        assert_eq!(DefaultTimerService::QUEUE_SIZE, 16);
    }

    #[test]
    fn test_minimal_preset() {
        assert_eq!(MinimalTimerService::MAX_TIMERS, 4);
        assert_eq!(MinimalTimerService::QUEUE_SIZE, 4);
    }
}
