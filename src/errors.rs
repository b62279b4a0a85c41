// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only [`WatchpipeError::WatchSetup`] is fatal to the whole engine. Launch
//! and runtime errors are reported per command and never escape the group
//! that owns the command.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchpipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The requested root cannot be watched.
    #[error("cannot watch '{}': {reason}", path.display())]
    WatchSetup { path: PathBuf, reason: String },

    /// The executable could not be resolved or spawned.
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A started process exited unsuccessfully. `-1` means no exit code was
    /// available (killed by a signal).
    #[error("'{command}' exited with code {code}")]
    Runtime { command: String, code: i32 },

    #[error("cannot parse command '{command}': {reason}")]
    CommandParse { command: String, reason: String },

    #[error("pipeline run finished with {failed} failed command(s)")]
    RunFailed { failed: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("file watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchpipeError>;
