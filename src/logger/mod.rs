//! Structured logging for route-server sources
//!
//! Thin tag-based facade over the `log` crate:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Every message carries a `LogTag`, which becomes the `log` target
//!   (`lg_sources::bgplgd`, `lg_sources::cache`, ...) so filters such as
//!   `RUST_LOG=lg_sources::gobgp=debug` work per component
//!
//! ## Usage
//!
//! ```rust
//! use lg_sources::logger::{self, LogTag};
//!
//! logger::warning(LogTag::Bgplgd, "neighbors request failed");
//! logger::debug(LogTag::Cache, "routes cache hit for 192.0.2.1");
//! ```
//!
//! The library never installs a logger; binaries call [`init`] once.

mod core;
mod levels;
mod tags;

pub use levels::LogLevel;
pub use tags::LogTag;

/// Install `env_logger` as the global logger
///
/// Defaults to `info` when `RUST_LOG` is unset. Calling it twice is harmless.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).format_timestamp_secs().try_init();
}

/// Log at ERROR level (critical failures)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
///
/// Used for failed backend calls before the error is handed to the caller.
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (source construction, periodic cache sweeps)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (cache hits/misses, backend requests)
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (per-record stream tracing)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Check whether a level is enabled for a tag before building an expensive message
pub fn enabled(tag: LogTag, level: LogLevel) -> bool {
    core::should_log(&tag, level)
}
