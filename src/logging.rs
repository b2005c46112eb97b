//! Structured logging setup
//!
//! Logs go to stderr through `tracing-subscriber` so that reports printed on
//! stdout stay machine-readable. `RUST_LOG` takes precedence over the level
//! chosen from the command-line flags.

use crate::error::{AppError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Pick the level from the verbosity flags; debug wins over verbose
    pub fn from_flags(verbose: bool, debug: bool) -> Self {
        if debug {
            LogLevel::Debug
        } else if verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Default filter directive: our crate at this level, dependencies at warn
    pub fn directive(&self) -> String {
        format!("warn,protocol_bench={},pbench={}", self.as_str(), self.as_str())
    }
}

/// Build the filter, letting `RUST_LOG` override the flag-derived default
pub fn build_filter(level: LogLevel) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| AppError::config(format!("Invalid {}: {}", EnvFilter::DEFAULT_ENV, e))),
        _ => EnvFilter::try_new(level.directive())
            .map_err(|e| AppError::internal(format!("Invalid log filter: {}", e))),
    }
}

/// Install the global subscriber; a second call is a no-op
pub fn init_logging(verbose: bool, debug: bool, enable_color: bool) -> Result<()> {
    let level = LogLevel::from_flags(verbose, debug);
    let filter = build_filter(level)?;

    let installed = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(enable_color)
        .with_target(debug)
        .try_init();

    if installed.is_ok() {
        tracing::debug!(level = level.as_str(), "logging initialized");
    }
    Ok(())
}
