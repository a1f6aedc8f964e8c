//! Test fixtures and utilities for tick-service testing.
//!
//! Provides:
//! - `record`: callback that logs its context value per test thread
//! - `take_calls`: drain the recorded context values
//! - `tick`: advance a service by several milliseconds
//!
//! Dispatch runs callbacks on the calling thread, so a thread-local recorder
//! keeps parallel tests apart.

#![allow(dead_code)]

use std::cell::RefCell;
use tick_service::TimerService;

thread_local! {
    static CALLS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Callback that records its context value.
pub fn record(context: usize) {
    CALLS.with(|c| c.borrow_mut().push(context));
}

/// Callback that does nothing.
pub fn noop(_context: usize) {}

/// Drain everything recorded on this thread so far.
pub fn take_calls() -> Vec<usize> {
    CALLS.with(|c| std::mem::take(&mut *c.borrow_mut()))
}

/// Advance the service by `ms` ticks.
pub fn tick<const N: usize, const M: usize>(service: &TimerService<N, M>, ms: usize) {
    for _ in 0..ms {
        service.tick_1ms();
    }
}

/// Advance the service one tick at a time, returning the ticks (1-based)
/// after which `dispatch` invoked at least one callback.
pub fn ticks_with_callbacks<const N: usize, const M: usize>(
    service: &TimerService<N, M>,
    ms: usize,
) -> Vec<usize> {
    let mut fired = Vec::new();
    for now in 1..=ms {
        service.tick_1ms();
        if service.dispatch().invoked() > 0 {
            fired.push(now);
        }
    }
    fired
}
