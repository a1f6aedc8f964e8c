//! Host-side schedule simulator for tick-service.
//!
//! Drives a `DefaultTimerService` tick by tick from a TOML plan and prints the
//! order in which callbacks run, followed by the event queue statistics. Use it
//! to size the event queue before flashing a board.
//!
//! # Usage
//!
//! ```bash
//! cargo run --features sim --bin tick-sim -- plan.toml
//! ```
//!
//! # Plan format
//!
//! ```toml
//! ticks = 1000          # milliseconds to simulate
//! dispatch_every = 5    # main loop runs dispatch every N ticks
//!
//! [[timer]]
//! name = "blink"
//! period_ms = 250
//! kind = "queue"        # or "flag"
//! start_at = 0          # optional, default 0
//! stop_at = 800         # optional
//! change_period = { at = 400, period_ms = 100 }  # optional
//! ```

use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::process::ExitCode;
use tick_service::{DefaultTimerService, TimerError, TimerId, TimerKind};

// ============================================================================
// Plan
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PlanKind {
    Flag,
    Queue,
}

impl From<PlanKind> for TimerKind {
    fn from(kind: PlanKind) -> Self {
        match kind {
            PlanKind::Flag => TimerKind::Flag,
            PlanKind::Queue => TimerKind::Queue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
struct PeriodChange {
    at: u64,
    period_ms: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TimerPlan {
    name: String,
    period_ms: u16,
    #[serde(default = "default_kind")]
    kind: PlanKind,
    #[serde(default)]
    start_at: u64,
    #[serde(default)]
    stop_at: Option<u64>,
    #[serde(default)]
    change_period: Option<PeriodChange>,
}

fn default_kind() -> PlanKind {
    PlanKind::Queue
}

fn default_dispatch_every() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct Plan {
    ticks: u64,
    #[serde(default = "default_dispatch_every")]
    dispatch_every: u64,
    #[serde(default, rename = "timer")]
    timers: Vec<TimerPlan>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
enum SimError {
    Usage,
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidPlan(&'static str),
    Timer(String, TimerError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Usage => write!(f, "usage: tick-sim <plan.toml>"),
            SimError::Io(e) => write!(f, "cannot read plan: {}", e),
            SimError::Parse(e) => write!(f, "invalid plan: {}", e),
            SimError::InvalidPlan(msg) => write!(f, "invalid plan: {}", msg),
            SimError::Timer(name, e) => write!(f, "timer '{}': {}", name, e),
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(e: std::io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<toml::de::Error> for SimError {
    fn from(e: toml::de::Error) -> Self {
        SimError::Parse(e)
    }
}

fn parse_plan(text: &str) -> Result<Plan, SimError> {
    let plan: Plan = toml::from_str(text)?;
    if plan.dispatch_every == 0 {
        return Err(SimError::InvalidPlan("dispatch_every must be at least 1"));
    }
    Ok(plan)
}

// ============================================================================
// Simulation
// ============================================================================

/// One callback invocation observed during the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Invocation {
    tick: u64,
    timer: usize,
}

thread_local! {
    static NOW: Cell<u64> = const { Cell::new(0) };
    static TRACE: RefCell<Vec<Invocation>> = const { RefCell::new(Vec::new()) };
}

fn record(timer: usize) {
    let tick = NOW.with(Cell::get);
    TRACE.with(|t| t.borrow_mut().push(Invocation { tick, timer }));
}

#[derive(Debug)]
struct Report {
    trace: Vec<Invocation>,
    max_used: usize,
    overflow_count: u32,
}

fn simulate(plan: &Plan) -> Result<Report, SimError> {
    let service = DefaultTimerService::new();
    TRACE.with(|t| t.borrow_mut().clear());

    let mut ids: Vec<TimerId> = Vec::with_capacity(plan.timers.len());
    for (index, timer) in plan.timers.iter().enumerate() {
        let id = service
            .create(timer.period_ms, timer.kind.into(), record, index)
            .map_err(|e| SimError::Timer(timer.name.clone(), e))?;
        ids.push(id);
    }

    for now in 0..=plan.ticks {
        NOW.with(|n| n.set(now));

        // Control calls happen in the main loop before the tick lands
        for (timer, &id) in plan.timers.iter().zip(&ids) {
            if timer.start_at == now {
                service.start_timer(id).ok();
            }
            if timer.stop_at == Some(now) {
                service.stop_timer(id).ok();
            }
            if let Some(change) = timer.change_period
                && change.at == now
            {
                service.change_period(id, change.period_ms).ok();
            }
        }

        if now > 0 {
            service.tick_1ms();
        }

        if now % plan.dispatch_every == 0 {
            service.dispatch();
        }
    }

    Ok(Report {
        trace: TRACE.with(|t| std::mem::take(&mut *t.borrow_mut())),
        max_used: service.queue_max_used(),
        overflow_count: service.queue_overflow_count(),
    })
}

fn run() -> Result<(), SimError> {
    let path = std::env::args().nth(1).ok_or(SimError::Usage)?;
    let text = std::fs::read_to_string(path)?;
    let plan = parse_plan(&text)?;
    let report = simulate(&plan)?;

    for invocation in &report.trace {
        let timer = &plan.timers[invocation.timer];
        let kind = match timer.kind {
            PlanKind::Flag => "flag",
            PlanKind::Queue => "queue",
        };
        println!("[{:>6} ms] {} ({})", invocation.tick, timer.name, kind);
    }

    println!();
    println!("callbacks:      {}", report.trace.len());
    println!("queue max used: {}/{}", report.max_used, DefaultTimerService::QUEUE_SIZE);
    println!("queue overflow: {}", report.overflow_count);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tick-sim: {}", e);
            ExitCode::FAILURE
        }
    }
}
