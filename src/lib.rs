//! # tick-service
//!
//! Cooperative software timers for interrupt-driven embedded systems with
//! zero heap allocation.
//!
//! **Key features:**
//! - **Static allocation** - Fixed timer pool and event queue sized by const generics
//! - **Two contexts** - A 1 ms tick from interrupt context, callbacks from the main loop
//! - **Two dispatch policies** - Coalescing flag timers and FIFO queue timers
//! - **Lock-free hand-off** - Single-producer/single-consumer event queue
//! - **Capacity tuning** - Queue high-water mark and overflow counter
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tick_service::{DefaultTimerService, TimerService};
//!
//! static TIMERS: DefaultTimerService = TimerService::new();
//!
//! fn blink(_context: usize) { /* toggle LED */ }
//!
//! // Main loop setup
//! let id = TIMERS.create_timer(500, blink, 0)?;
//! TIMERS.start_timer(id)?;
//!
//! // 1 ms timer interrupt
//! TIMERS.tick_1ms();
//!
//! // Main loop
//! loop {
//!     TIMERS.dispatch();
//! }
//! ```
//!
//! ## Optional Features
//!
//! - `stats` (default) - Event queue high-water mark and overflow counter
//! - `defmt` - Log through `defmt` and derive `defmt::Format` on public types
//! - `sim` - Host-side `tick-sim` schedule simulator binary
//!
//! This library is `no_std` compatible.

#![no_std]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

#[cfg(test)]
extern crate std;

extern crate heapless;

// ============================================================================
// Module Declarations
// ============================================================================

pub mod logging;
pub mod config;
pub mod error;
pub mod queue;
pub mod service;
pub mod timer;

// ============================================================================
// Re-exports - Public API
// ============================================================================

// Configuration
pub use config::{DEFAULT_MAX_TIMERS, DEFAULT_QUEUE_SIZE, DefaultTimerService, MinimalTimerService};

// Error types
pub use error::TimerError;

// Timer types
pub use timer::{SlotState, TimerCallback, TimerId, TimerInfo, TimerKind};

// Queue statistics
pub use queue::QueueStats;

// Service
pub use service::{DispatchReport, TimerService};

// ============================================================================
// Library Metadata
// ============================================================================

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
