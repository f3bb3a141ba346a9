//! Structured logging controlled by `ESPALIER_*` environment variables.
//!
//! # Environment Variables
//!
//! - `ESPALIER_DEBUG=true` - Enable debug logging
//! - `ESPALIER_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `ESPALIER_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use espalier_resolve::logging;
//!
//! // Initialize once at startup.
//! logging::init();
//! ```
//!
//! Inside the crate, the standard tracing macros carry structured fields:
//!
//! ```rust,ignore
//! use tracing::{debug, trace};
//!
//! debug!(entity = %entity, keys = keys.len(), "batch fetch");
//! trace!(entity = %entity, key = %key, "lazy hit");
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `ESPALIER_DEBUG`.
///
/// Returns `true` for "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("ESPALIER_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// The log level selected by `ESPALIER_LOG_LEVEL`.
///
/// Defaults to "debug" when `ESPALIER_DEBUG` is on, otherwise "warn".
pub fn log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("ESPALIER_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// The output format selected by `ESPALIER_LOG_FORMAT`.
///
/// Defaults to "json" for structured output.
pub fn log_format() -> &'static str {
    env::var("ESPALIER_LOG_FORMAT")
        .map(|format| match format.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// Initialize the logging system.
///
/// Call once at application startup; later calls are no-ops. Does nothing
/// unless `ESPALIER_DEBUG` or `ESPALIER_LOG_LEVEL` is set, so embedding
/// applications keep control of their own subscriber by default.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("ESPALIER_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = log_level();
            let filter = EnvFilter::try_new(format!(
                "espalier={level},espalier_resolve={level},espalier_schema={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            match log_format() {
                "pretty" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
            }

            tracing::info!(level = level, format = log_format(), "logging initialized");
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            // Without the tracing-subscriber feature, emitted events go to
            // whatever subscriber the application installs.
        }
    });
}

/// Initialize logging at a specific level.
///
/// Mutates the process environment; call at startup before spawning
/// threads.
pub fn init_with_level(level: &str) {
    // SAFETY: callers invoke this at startup before spawning threads.
    unsafe {
        env::set_var("ESPALIER_LOG_LEVEL", level);
    }
    init();
}

/// Enable debug logging and initialize.
///
/// Mutates the process environment; call at startup before spawning
/// threads.
pub fn init_debug() {
    // SAFETY: callers invoke this at startup before spawning threads.
    unsafe {
        env::set_var("ESPALIER_DEBUG", "true");
    }
    init();
}

/// Log at debug level only when `ESPALIER_DEBUG` is on at runtime.
#[macro_export]
macro_rules! espalier_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::tracing::debug!($($arg)*);
        }
    };
}

/// Log at trace level only when `ESPALIER_DEBUG` is on at runtime.
#[macro_export]
macro_rules! espalier_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            $crate::tracing::trace!($($arg)*);
        }
    };
}
