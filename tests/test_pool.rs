//! Timer pool registration and control tests.
//!
//! Tests first-fit slot claiming, pool exhaustion, start/stop/change-period
//! semantics, destroy and reuse, and invalid-id handling.

#[allow(clippy::duplicate_mod)]
#[path = "fixtures/mod.rs"]
mod fixtures;

use fixtures::{noop, record, take_calls, tick, ticks_with_callbacks};
use tick_service::{
    DefaultTimerService, MinimalTimerService, SlotState, TimerError, TimerId, TimerKind,
    TimerService,
};

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_pool_capacity_then_no_free_slot() {
    let service = DefaultTimerService::new();

    for expected in 0..DefaultTimerService::MAX_TIMERS {
        let id = service.create_timer(10, noop, 0).unwrap();
        assert_eq!(id.index(), expected, "slots should be claimed first-fit");
    }

    assert_eq!(
        service.create_timer(10, noop, 0),
        Err(TimerError::NoFreeSlot)
    );
    assert_eq!(
        service.create_timer_flag(10, noop, 0),
        Err(TimerError::NoFreeSlot)
    );
    assert_eq!(service.claimed_count(), DefaultTimerService::MAX_TIMERS);
}

#[test]
fn test_create_variants_set_kind() {
    let service = MinimalTimerService::new();

    let default = service.create_timer(1, noop, 0).unwrap();
    let queue = service.create_timer_queue(1, noop, 0).unwrap();
    let flag = service.create_timer_flag(1, noop, 0).unwrap();
    let explicit = service.create(1, TimerKind::Flag, noop, 0).unwrap();

    assert_eq!(service.timer_info(default).unwrap().kind, TimerKind::Queue);
    assert_eq!(service.timer_info(queue).unwrap().kind, TimerKind::Queue);
    assert_eq!(service.timer_info(flag).unwrap().kind, TimerKind::Flag);
    assert_eq!(service.timer_info(explicit).unwrap().kind, TimerKind::Flag);
}

#[test]
fn test_created_timer_is_inactive() {
    let service = MinimalTimerService::new();
    let id = service.create_timer(2, record, 1).unwrap();

    tick(&service, 10);
    service.dispatch();

    assert!(take_calls().is_empty());
    let info = service.timer_info(id).unwrap();
    assert_eq!(info.state, SlotState::Configured);
    assert_eq!(info.elapsed_ms, 0);
    assert!(!info.pending);
}

// ============================================================================
// Start / Stop
// ============================================================================

#[test]
fn test_started_timer_fires_every_period() {
    let service = MinimalTimerService::new();
    let id = service.create_timer(4, record, 1).unwrap();
    service.start_timer(id).unwrap();

    assert_eq!(ticks_with_callbacks(&service, 13), [4, 8, 12]);
    assert_eq!(take_calls(), [1, 1, 1]);
}

#[test]
fn test_stop_then_start_restarts_phase() {
    let service = MinimalTimerService::new();
    let id = service.create_timer(5, noop, 0).unwrap();
    service.start_timer(id).unwrap();

    tick(&service, 3);
    assert_eq!(service.timer_info(id).unwrap().elapsed_ms, 3);

    service.stop_timer(id).unwrap();
    service.start_timer(id).unwrap();
    assert_eq!(service.timer_info(id).unwrap().elapsed_ms, 0);

    // Next firing exactly one full period later, not 2 ticks later
    assert_eq!(ticks_with_callbacks(&service, 10), [5, 10]);
}

#[test]
fn test_start_while_running_restarts_phase() {
    let service = MinimalTimerService::new();
    let id = service.create_timer_flag(4, noop, 0).unwrap();
    service.start_timer(id).unwrap();

    tick(&service, 3);
    service.start_timer(id).unwrap();

    assert_eq!(ticks_with_callbacks(&service, 8), [4, 8]);
}

#[test]
fn test_stopped_timer_does_not_advance() {
    let service = MinimalTimerService::new();
    let id = service.create_timer(3, record, 9).unwrap();
    service.start_timer(id).unwrap();
    tick(&service, 2);

    service.stop_timer(id).unwrap();
    tick(&service, 10);
    service.dispatch();

    assert!(take_calls().is_empty());
    let info = service.timer_info(id).unwrap();
    assert_eq!(info.state, SlotState::Configured);
    assert_eq!(info.elapsed_ms, 2);
}

#[test]
fn test_stop_clears_pending_flag() {
    let service = MinimalTimerService::new();
    let id = service.create_timer_flag(1, record, 3).unwrap();
    service.start_timer(id).unwrap();

    tick(&service, 1);
    assert!(service.timer_info(id).unwrap().pending);

    service.stop_timer(id).unwrap();
    assert!(!service.timer_info(id).unwrap().pending);

    service.dispatch();
    assert!(take_calls().is_empty());
}

#[test]
fn test_stop_does_not_retract_queued_event() {
    let service = MinimalTimerService::new();
    let id = service.create_timer_queue(1, record, 5).unwrap();
    service.start_timer(id).unwrap();

    tick(&service, 2);
    service.stop_timer(id).unwrap();

    let report = service.dispatch();
    assert_eq!(report.queued, 2);
    assert_eq!(take_calls(), [5, 5]);
}

// ============================================================================
// Change period
// ============================================================================

#[test]
fn test_change_period_keeps_elapsed() {
    let service = MinimalTimerService::new();
    let id = service.create_timer(10, noop, 0).unwrap();
    service.start_timer(id).unwrap();

    tick(&service, 4);
    service.change_period(id, 6).unwrap();

    let info = service.timer_info(id).unwrap();
    assert_eq!(info.period_ms, 6);
    assert_eq!(info.elapsed_ms, 4);

    // Two more ticks reach the new period
    assert_eq!(ticks_with_callbacks(&service, 8), [2, 8]);
}

#[test]
fn test_change_period_below_elapsed_fires_next_tick() {
    let cases = [
        // (elapsed before change, new period)
        (5, 3),
        (5, 5),
        (5, 1),
    ];

    for (elapsed, period) in cases {
        let service = MinimalTimerService::new();
        let id = service.create_timer_flag(100, noop, 0).unwrap();
        service.start_timer(id).unwrap();
        tick(&service, elapsed);

        service.change_period(id, period).unwrap();
        let fired = ticks_with_callbacks(&service, 1);
        assert_eq!(
            fired,
            [1],
            "elapsed {} with new period {} should fire on the next tick",
            elapsed,
            period
        );
    }
}

#[test]
fn test_period_zero_never_fires() {
    let service = MinimalTimerService::new();
    let id = service.create_timer_flag(0, record, 0).unwrap();
    service.start_timer(id).unwrap();

    assert!(ticks_with_callbacks(&service, 50).is_empty());
    assert_eq!(service.timer_info(id).unwrap().elapsed_ms, 50);

    // A real period takes effect right away
    service.change_period(id, 10).unwrap();
    assert_eq!(ticks_with_callbacks(&service, 1), [1]);
}

#[test]
fn test_elapsed_saturates_instead_of_wrapping() {
    let service = MinimalTimerService::new();
    let id = service.create_timer(0, noop, 0).unwrap();
    service.start_timer(id).unwrap();

    tick(&service, u16::MAX as usize + 100);
    assert_eq!(service.timer_info(id).unwrap().elapsed_ms, u16::MAX);
}

// ============================================================================
// Destroy / reuse
// ============================================================================

#[test]
fn test_destroy_then_reuse_slot() {
    let service = MinimalTimerService::new();
    let ids: Vec<TimerId> = (0..4)
        .map(|i| service.create_timer(1, noop, i).unwrap())
        .collect();

    service.destroy_timer(ids[2]).unwrap();
    assert_eq!(service.claimed_count(), 3);
    assert!(service.timer_info(ids[2]).is_none());

    let reused = service.create_timer_flag(7, record, 99).unwrap();
    assert_eq!(reused, ids[2]);
    assert_eq!(service.timer_info(reused).unwrap().period_ms, 7);
    assert_eq!(
        service.create_timer(1, noop, 0),
        Err(TimerError::NoFreeSlot)
    );
}

#[test]
fn test_recreated_slot_skips_destroyed_timer_events() {
    let service = MinimalTimerService::new();
    let old = service.create_timer(1, record, 1).unwrap();
    service.start_timer(old).unwrap();
    tick(&service, 2);
    assert_eq!(service.queue_len(), 2);

    service.destroy_timer(old).unwrap();
    let new = service.create_timer_flag(50, record, 99).unwrap();
    assert_eq!(new, old, "slot should be reused first-fit");

    let report = service.dispatch();
    assert!(take_calls().is_empty(), "never-started timer must not run");
    assert_eq!(report.queued, 0);
    assert_eq!(report.flagged, 0);
    assert_eq!(report.skipped, 2);
}

#[test]
fn test_destroyed_timer_stops_firing() {
    let service = MinimalTimerService::new();
    let id = service.create_timer_flag(1, record, 1).unwrap();
    service.start_timer(id).unwrap();

    service.destroy_timer(id).unwrap();
    tick(&service, 5);
    service.dispatch();

    assert!(take_calls().is_empty());
    assert_eq!(service.destroy_timer(id), Err(TimerError::InvalidId));
}

// ============================================================================
// Invalid ids
// ============================================================================

#[test]
fn test_invalid_ids_are_no_ops() {
    let service = TimerService::<2, 2>::new();
    let claimed = service.create_timer(3, noop, 0).unwrap();
    service.start_timer(claimed).unwrap();

    let invalid = [TimerId::new(1), TimerId::new(2), TimerId::new(usize::MAX)];

    for id in invalid {
        assert_eq!(service.start_timer(id), Err(TimerError::InvalidId));
        assert_eq!(service.stop_timer(id), Err(TimerError::InvalidId));
        assert_eq!(service.change_period(id, 1), Err(TimerError::InvalidId));
        assert_eq!(service.destroy_timer(id), Err(TimerError::InvalidId));
        assert!(service.timer_info(id).is_none());
    }

    // The claimed slot is untouched
    let info = service.timer_info(claimed).unwrap();
    assert_eq!(info.state, SlotState::Active);
    assert_eq!(info.period_ms, 3);
    assert_eq!(service.claimed_count(), 1);
    assert_eq!(service.active_count(), 1);
}

#[test]
fn test_init_returns_to_fresh_state() {
    let service = MinimalTimerService::new();
    for i in 0..4 {
        let id = service.create_timer(1, record, i).unwrap();
        service.start_timer(id).unwrap();
    }
    tick(&service, 1);

    service.init();
    service.dispatch();

    assert!(take_calls().is_empty());
    assert_eq!(service.claimed_count(), 0);
    assert_eq!(service.queue_len(), 0);
    assert!(service.create_timer(1, noop, 0).is_ok());
}

#[test]
#[cfg(feature = "stats")]
fn test_init_keeps_queue_stats() {
    let service = TimerService::<2, 2>::new();
    let id = service.create_timer(1, noop, 0).unwrap();
    service.start_timer(id).unwrap();
    tick(&service, 3);
    assert_eq!(service.queue_overflow_count(), 1);

    service.init();
    assert_eq!(service.queue_max_used(), 2);
    assert_eq!(service.queue_overflow_count(), 1);

    service.clear_queue_stats();
    assert_eq!(service.queue_max_used(), 0);
    assert_eq!(service.queue_overflow_count(), 0);
}
