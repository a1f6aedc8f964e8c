#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::{entry, exception};
use panic_halt as _;
use tick_service::{DefaultTimerService, TimerService};

// Core clock of the target board; SysTick reloads every 1 ms
const CORE_CLOCK_HZ: u32 = 48_000_000;

// Shared by the SysTick handler (tick) and the main loop (dispatch)
static TIMERS: DefaultTimerService = TimerService::new();

// Updated only from dispatch, so load/store is enough (no RMW on thumbv6m)
static HEARTBEATS: AtomicU32 = AtomicU32::new(0);
static SAMPLES: AtomicU32 = AtomicU32::new(0);

// Slow housekeeping: every firing matters, so it is queued
fn heartbeat(_context: usize) {
    let count = HEARTBEATS.load(Ordering::Relaxed);
    HEARTBEATS.store(count.wrapping_add(1), Ordering::Relaxed);
}

// Fast polling: late firings may coalesce
fn sample_inputs(channel: usize) {
    let total = SAMPLES.load(Ordering::Relaxed);
    SAMPLES.store(total.wrapping_add(channel as u32), Ordering::Relaxed);
}

#[exception]
fn SysTick() {
    TIMERS.tick_1ms();
}

#[entry]
fn main() -> ! {
    let Some(mut core) = cortex_m::Peripherals::take() else {
        loop {
            cortex_m::asm::nop();
        }
    };

    TIMERS.init();

    if let Ok(id) = TIMERS.create_timer(1000, heartbeat, 0) {
        let _ = TIMERS.start_timer(id);
    }
    if let Ok(id) = TIMERS.create_timer_flag(1, sample_inputs, 1) {
        let _ = TIMERS.start_timer(id);
    }

    core.SYST.set_clock_source(SystClkSource::Core);
    core.SYST.set_reload(CORE_CLOCK_HZ / 1_000 - 1);
    core.SYST.clear_current();
    core.SYST.enable_counter();
    core.SYST.enable_interrupt();

    loop {
        let report = TIMERS.dispatch();
        if report.invoked() == 0 {
            // Sleep until the next tick
            cortex_m::asm::wfi();
        }
        core::hint::black_box(TIMERS.queue_stats());
    }
}

// Required: exception handler
#[exception]
unsafe fn HardFault(_ef: &cortex_m_rt::ExceptionFrame) -> ! {
    loop {
        cortex_m::asm::nop();
    }
}
