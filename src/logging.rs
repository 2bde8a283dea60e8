//! Logging facade
//!
//! The router logs through these macros so the backend is picked by Cargo
//! feature instead of at every call site.
//!
//! - `log` (default) - forwards to the `log` crate
//! - `tracing` - forwards to `tracing` events
//!
//! Enable at most one of them. With neither enabled the macros expand to nothing.
//!
//! ```ignore
//! use query_navigator::{debug_log, warn_log};
//!
//! debug_log!("dispatching route '{}'", name);
//! warn_log!("middleware '{}' failed: {}", middleware.name(), err);
//! ```

/// Trace-level logging, used for cache and codec internals.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Info-level logging
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Warn-level logging
///
/// Used for recoverable problems such as a failing middleware.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

/// Error-level logging
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
    };
}
