//! # formcheck-log
//!
//! Subscriber setup for the `tracing` events emitted by `formcheck-validator`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! // Pick a preset from FORMCHECK_LOG / RUST_LOG, or fall back to the build profile.
//! let _guard = formcheck_log::auto_init()?;
//!
//! tracing::info!(form = "signup", "engine attached");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
mod config;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Format, WriterConfig};

/// Result type for logger operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Error type for logger operations
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The level directive could not be parsed into a filter
    #[error("Invalid filter '{directive}': {reason}")]
    Filter {
        /// The rejected directive
        directive: String,
        /// Why the parser rejected it
        reason: String,
    },

    /// A global subscriber has already been installed
    #[error("Global subscriber already set: {0}")]
    AlreadySet(String),
}

static TEST_INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

// ============================================================================
// Initialization Functions
// ============================================================================

/// Auto-detect and initialize the best logging configuration
pub fn auto_init() -> Result<LoggerGuard> {
    if std::env::var("FORMCHECK_LOG").is_ok() || std::env::var("RUST_LOG").is_ok() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Initialize with default configuration
pub fn init() -> Result<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize with custom configuration
pub fn init_with(config: Config) -> Result<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

/// Initialize for tests.
///
/// Safe to call from every test: only the first call installs a subscriber,
/// later calls (or calls after another subscriber won the race) return a
/// no-op guard.
pub fn init_test() -> LoggerGuard {
    if TEST_INIT.set(()).is_err() || tracing::dispatcher::has_been_set() {
        return LoggerGuard::noop();
    }
    init_with(Config::test()).unwrap_or_else(|_| LoggerGuard::noop())
}
