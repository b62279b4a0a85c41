// src/pipeline/command.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{Result, WatchpipeError};
use crate::exec::ProcessHandle;
use crate::types::Verbosity;

/// A single executable invocation.
///
/// Immutable once built. A `Command` owns no process itself: every call to
/// [`Command::start`] creates a fresh [`ProcessHandle`], so the same command
/// is reused across pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    application: String,
    arguments: Vec<String>,
    directory: PathBuf,
    environment: BTreeMap<String, String>,
    verbosity: Verbosity,
}

impl Command {
    pub fn new(application: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            application: application.into(),
            arguments: Vec::new(),
            directory: directory.into(),
            environment: BTreeMap::new(),
            verbosity: Verbosity::default(),
        }
    }

    /// Split a shell-style command line into program and arguments.
    ///
    /// Quoted substrings stay single arguments, so `sh -c "sleep 1; echo x"`
    /// yields three words.
    pub fn parse(line: &str, directory: impl Into<PathBuf>) -> Result<Self> {
        let mut words = shell_words::split(line).map_err(|e| WatchpipeError::CommandParse {
            command: line.to_string(),
            reason: e.to_string(),
        })?;
        if words.is_empty() {
            return Err(WatchpipeError::CommandParse {
                command: line.to_string(),
                reason: "empty command".to_string(),
            });
        }
        let application = words.remove(0);
        Ok(Self::new(application, directory).with_args(words))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn with_environment(mut self, environment: &BTreeMap<String, String>) -> Self {
        self.environment
            .extend(environment.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Variables merged over the ambient environment at spawn time.
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn verbosity_level(&self) -> Verbosity {
        self.verbosity
    }

    /// The command re-quoted as a single shell line, for logs.
    pub fn label(&self) -> String {
        let mut words = Vec::with_capacity(self.arguments.len() + 1);
        words.push(self.application.as_str());
        words.extend(self.arguments.iter().map(String::as_str));
        shell_words::join(words)
    }

    /// Spawn a new process for this command.
    ///
    /// Fails with [`WatchpipeError::Launch`] if the executable cannot be
    /// resolved or spawned.
    pub fn start(&self) -> Result<ProcessHandle> {
        ProcessHandle::spawn(self)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// How a command's process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The process exited on its own. `-1` when no exit code was reported.
    Exited(i32),
    /// The process was stopped because a newer trigger preempted its run.
    Terminated,
    /// The process could not be started at all.
    LaunchFailed(String),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Exited(0))
    }

    /// Non-zero exit or launch failure. Termination is not a failure.
    pub fn is_failure(&self) -> bool {
        match self {
            CommandOutcome::Exited(code) => *code != 0,
            CommandOutcome::LaunchFailed(_) => true,
            CommandOutcome::Terminated => false,
        }
    }
}

/// Lifecycle of one command within one pipeline run.
///
/// `Idle -> Running -> Finished(..)`; a finished command only becomes `Idle`
/// again when the next run starts a fresh process for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Idle,
    Running,
    Finished(CommandOutcome),
}

impl CommandState {
    pub fn is_running(&self) -> bool {
        matches!(self, CommandState::Running)
    }

    pub fn outcome(&self) -> Option<&CommandOutcome> {
        match self {
            CommandState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}
