//! Logging macros.
//!
//! The same macros work across targets:
//! - `defmt` feature: forwards to `defmt`
//! - Crate unit tests: prints to stdout
//! - Otherwise: compiles to nothing
//!
//! Messages logged from interrupt context (the tick path) stay at trace level
//! and carry only integers and error codes.

/// Log warning message
#[macro_export]
#[doc(hidden)]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        ::std::println!("[WARN] {}", ::std::format!($($arg)*));
    }};
}

/// Log debug message
#[macro_export]
#[doc(hidden)]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        ::std::println!("[DEBUG] {}", ::std::format!($($arg)*));
    }};
}

/// Log trace message
#[macro_export]
#[doc(hidden)]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        ::std::println!("[TRACE] {}", ::std::format!($($arg)*));
    }};
}
