// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag here is optional: unset values fall back to the config file
//! (`--config`) and then to the built-in defaults in
//! [`crate::config::settings`].

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::config::duration::parse_duration;

/// Command-line arguments for `watchpipe`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "watchpipe",
    version,
    about = "Re-run a build/test/run pipeline whenever watched sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional TOML config file with `[watch]` and `[pipeline]` sections.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to watch recursively.
    #[arg(long, value_name = "DIR")]
    pub watch: Option<PathBuf>,

    /// Working directory for every command (defaults to the watch directory).
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Commands of one execution group, separated by `--exec-delim`.
    /// Repeat the flag to add further groups; groups run in order.
    #[arg(long = "exec", value_name = "COMMANDS")]
    pub exec: Vec<String>,

    /// Delimiter used to split an execution group into commands.
    #[arg(long = "exec-delim", value_name = "STR")]
    pub exec_delim: Option<String>,

    /// Comma-separated file extensions (or exact file names) to react to.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub exts: Option<Vec<String>>,

    /// Comma-separated file/directory names to ignore anywhere in a path.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub ignore: Option<Vec<String>>,

    /// Batch window for filesystem events, e.g. `2s` or `500ms`.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub rate: Option<Duration>,

    /// Build output path relative to the watch directory (default groups only).
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,

    /// Default groups run the test suite instead of the built binary.
    #[arg(long)]
    pub test: bool,

    /// Environment variable injected into every command (`KEY=VALUE`).
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Stop the pipeline after the first execution group with a failure.
    #[arg(long)]
    pub strict: bool,

    /// How long a terminated command may take to exit before it is killed.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub grace_period: Option<Duration>,

    /// Run the pipeline once without watching, then exit.
    #[arg(long)]
    pub once: bool,

    /// Resolve and print the pipeline, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `-v`/`--silent`, then `WATCHPIPE_LOG`, then `info` apply.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(long, conflicts_with = "verbose")]
    pub silent: bool,

    /// Extra arguments appended to the last command of the final group.
    #[arg(last = true, value_name = "ARGS")]
    pub arguments: Vec<String>,
}

impl CliArgs {
    /// Log level requested on the command line, if any.
    pub fn requested_log_level(&self) -> Option<LogLevel> {
        if self.log_level.is_some() {
            return self.log_level;
        }
        if self.silent {
            return Some(LogLevel::Error);
        }
        match self.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
