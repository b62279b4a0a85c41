// src/engine/event_handlers.rs

//! Event handling logic for the core runner.

use tracing::{debug, info};

use crate::engine::report::RunOutcome;
use crate::engine::{Generation, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Stop the run of this generation and wait until its processes exited.
    Preempt { generation: Generation },
    /// Start walking the pipeline for this generation.
    StartRun {
        generation: Generation,
        reason: TriggerReason,
    },
    /// The current generation finished without being preempted.
    Report {
        generation: Generation,
        outcome: RunOutcome,
    },
}

/// Decision returned by the core after handling a single `RunnerEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runner loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a trigger.
///
/// The generation is bumped before anything else. If a run is active, its
/// preemption comes first in the returned commands so the old processes are
/// gone before the new run starts its first group.
pub fn handle_trigger(
    generation: &mut Generation,
    active: &mut Option<Generation>,
    reason: TriggerReason,
) -> CoreStep {
    *generation += 1;
    let mut commands = Vec::with_capacity(2);

    if let Some(previous) = active.take() {
        debug!(previous, next = *generation, "preempting in-flight run");
        commands.push(CoreCommand::Preempt {
            generation: previous,
        });
    }

    info!(generation = *generation, %reason, "starting pipeline run");
    *active = Some(*generation);
    commands.push(CoreCommand::StartRun {
        generation: *generation,
        reason,
    });

    CoreStep::running(commands)
}

/// Handle the end of a run.
///
/// A completion for anything other than the active generation is stale and
/// has no effect.
pub fn handle_run_finished(
    active: &mut Option<Generation>,
    generation: Generation,
    outcome: RunOutcome,
) -> CoreStep {
    if *active != Some(generation) {
        debug!(generation, active = ?*active, "ignoring stale run completion");
        return CoreStep::running(Vec::new());
    }

    *active = None;
    CoreStep::running(vec![CoreCommand::Report {
        generation,
        outcome,
    }])
}

/// Handle a shutdown request: preempt whatever runs and stop the loop.
pub fn handle_shutdown(generation: &mut Generation, active: &mut Option<Generation>) -> CoreStep {
    *generation += 1;
    let commands = active
        .take()
        .map(|previous| CoreCommand::Preempt {
            generation: previous,
        })
        .into_iter()
        .collect();

    CoreStep {
        commands,
        keep_running: false,
    }
}
