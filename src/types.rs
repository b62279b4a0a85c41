// src/types.rs

use serde::Deserialize;

/// What the runner does after an execution group in which a command failed.
///
/// - `Continue`: run the next group anyway (default). A live-reload loop is
///   best effort; the final "run the binary" step is expected to fail often.
/// - `Strict`: stop the pipeline after the first group with a failure. This
///   is an opt-in deviation from the default behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Continue,
    Strict,
}

/// How loudly a command reports its own lifecycle.
///
/// - `Quiet`: launches and exits are only visible at debug level.
/// - `Normal`: exit codes are logged at info; launches at debug.
/// - `Verbose`: launches (with argv and working directory) are logged at
///   info as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn logs_launches(self) -> bool {
        matches!(self, Verbosity::Verbose)
    }

    pub fn logs_exits(self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
