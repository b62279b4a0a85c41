// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The runner talks to a `CommandExecutor` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`ProcessExecutor`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::config::settings::DEFAULT_GRACE_PERIOD;
use crate::engine::Preemption;
use crate::exec::supervisor::supervise;
use crate::pipeline::{Command, CommandOutcome};

pub type ExecuteFuture = Pin<Box<dyn Future<Output = CommandOutcome> + Send + 'static>>;

/// Runs one command for one generation.
///
/// The returned future must resolve once the command has ended. When
/// `preemption` fires, implementations stop the command and only resolve
/// after it is gone.
pub trait CommandExecutor: Send + Sync + 'static {
    fn execute(&self, command: Arc<Command>, preemption: Preemption) -> ExecuteFuture;
}

/// Spawns real OS processes.
#[derive(Debug, Clone, Copy)]
pub struct ProcessExecutor {
    grace_period: Duration,
}

impl ProcessExecutor {
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, command: Arc<Command>, preemption: Preemption) -> ExecuteFuture {
        Box::pin(supervise(command, preemption, self.grace_period))
    }
}
