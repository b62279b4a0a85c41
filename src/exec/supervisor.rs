// src/exec/supervisor.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::Preemption;
use crate::errors::WatchpipeError;
use crate::pipeline::{Command, CommandOutcome};

/// Run `command` until it exits or its generation is preempted.
///
/// Waiting and preemption race in one `select!`: whichever happens first
/// wins. On preemption the process group is terminated and awaited before
/// this returns. A command whose generation is already stale is not started.
pub async fn supervise(
    command: Arc<Command>,
    mut preemption: Preemption,
    grace_period: Duration,
) -> CommandOutcome {
    let generation = preemption.generation();

    if preemption.is_preempted() {
        debug!(generation, command = %command, "skipping launch of preempted run");
        return CommandOutcome::Terminated;
    }

    let mut process = match command.start() {
        Ok(process) => process,
        Err(err) => return CommandOutcome::LaunchFailed(err.to_string()),
    };

    if command.verbosity_level().logs_launches() {
        info!(
            generation,
            command = %command,
            dir = %command.directory().display(),
            pid = ?process.id(),
            "started command"
        );
    } else {
        debug!(generation, command = %command, pid = ?process.id(), "started command");
    }

    tokio::select! {
        result = process.wait() => match result {
            Ok(()) => CommandOutcome::Exited(0),
            Err(WatchpipeError::Runtime { code, .. }) => CommandOutcome::Exited(code),
            Err(err) => {
                warn!(generation, command = %command, error = %err, "failed waiting for command");
                CommandOutcome::Exited(-1)
            }
        },
        _ = preemption.preempted() => {
            debug!(generation, command = %command, "terminating preempted command");
            if let Err(err) = process.terminate(grace_period).await {
                warn!(generation, command = %command, error = %err, "failed to terminate command");
            }
            process
                .state()
                .outcome()
                .cloned()
                .unwrap_or(CommandOutcome::Terminated)
        }
    }
}
