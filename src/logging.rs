// src/logging.rs

//! Logging setup for `watchpipe` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `-v` / `-vv` / `--silent` shorthands
//! 3. `WATCHPIPE_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `info`
//!
//! Logs are sent to STDERR so that stdout belongs to the commands the
//! pipeline runs.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;
use crate::types::Verbosity;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = effective_level(cli_level);

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Resolve the level that `init_logging` would install.
pub fn effective_level(cli_level: Option<LogLevel>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("WATCHPIPE_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    }
}

/// Map the effective log level onto command verbosity.
pub fn verbosity_for(level: tracing::Level) -> Verbosity {
    if level >= tracing::Level::DEBUG {
        Verbosity::Verbose
    } else if level <= tracing::Level::WARN {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
