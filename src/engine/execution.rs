// src/engine/execution.rs

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::report::{GroupReport, RunNotice, RunOutcome, RunReport};
use crate::engine::{Generation, Preemption};
use crate::exec::CommandExecutor;
use crate::pipeline::{CommandOutcome, ExecutionGroup, Pipeline};
use crate::types::FailurePolicy;

/// Walk `pipeline` for the generation carried by `preemption`.
///
/// Groups run strictly in order; all commands of a group are started
/// together and the group completes when every one of them has ended. When a
/// newer generation is published, each command terminates its own process
/// and the walk stops before the next group.
pub async fn run_pipeline<E>(
    pipeline: Arc<Pipeline>,
    executor: Arc<E>,
    preemption: Preemption,
    policy: FailurePolicy,
    notices: broadcast::Sender<RunNotice>,
) -> RunOutcome
where
    E: CommandExecutor + ?Sized,
{
    let generation = preemption.generation();
    let mut report = RunReport::default();
    let _ = notices.send(RunNotice::RunStarted { generation });

    for (index, group) in pipeline.groups().iter().enumerate() {
        if preemption.is_preempted() {
            debug!(generation, group = index, "run preempted before group");
            return RunOutcome::Preempted;
        }

        let _ = notices.send(RunNotice::GroupStarted {
            generation,
            group: index,
        });
        debug!(generation, group = index, commands = group.len(), "starting group");

        let group_report =
            run_group(index, group, executor.as_ref(), &preemption, &notices).await;

        if preemption.is_preempted() {
            debug!(generation, group = index, "run preempted during group");
            return RunOutcome::Preempted;
        }

        let _ = notices.send(RunNotice::GroupCompleted {
            generation,
            group: index,
        });

        let failed = group_report.has_failure();
        report.groups.push(group_report);

        if failed && policy == FailurePolicy::Strict {
            warn!(generation, group = index, "group failed; skipping remaining groups");
            return RunOutcome::Aborted {
                report,
                group: index,
            };
        }
    }

    RunOutcome::Completed(report)
}

async fn run_group<E>(
    index: usize,
    group: &ExecutionGroup,
    executor: &E,
    preemption: &Preemption,
    notices: &broadcast::Sender<RunNotice>,
) -> GroupReport
where
    E: CommandExecutor + ?Sized,
{
    let generation = preemption.generation();
    let mut set = JoinSet::new();

    for (position, command) in group.commands().iter().enumerate() {
        let fut = executor.execute(Arc::clone(command), preemption.clone());
        set.spawn(async move { (position, fut.await) });
    }

    let mut outcomes: Vec<Option<CommandOutcome>> = vec![None; group.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((position, outcome)) => {
                let command = &group.commands()[position];
                log_outcome(
                    generation,
                    index,
                    &command.label(),
                    command.verbosity_level().logs_exits(),
                    &outcome,
                );
                let _ = notices.send(RunNotice::CommandFinished {
                    generation,
                    group: index,
                    command: command.label(),
                    outcome: outcome.clone(),
                });
                outcomes[position] = Some(outcome);
            }
            Err(e) => warn!(generation, group = index, error = %e, "command task failed"),
        }
    }

    GroupReport {
        index,
        outcomes: group
            .commands()
            .iter()
            .zip(outcomes)
            .map(|(command, outcome)| {
                let outcome = outcome.unwrap_or_else(|| {
                    CommandOutcome::LaunchFailed("command task failed".to_string())
                });
                (command.label(), outcome)
            })
            .collect(),
    }
}

fn log_outcome(
    generation: Generation,
    group: usize,
    command: &str,
    logs_exits: bool,
    outcome: &CommandOutcome,
) {
    match outcome {
        CommandOutcome::Exited(code) if logs_exits => {
            info!(generation, group, command, exit_code = *code, "command exited")
        }
        CommandOutcome::Exited(code) => {
            debug!(generation, group, command, exit_code = *code, "command exited")
        }
        CommandOutcome::Terminated => debug!(generation, group, command, "command terminated"),
        CommandOutcome::LaunchFailed(reason) => {
            warn!(generation, group, command, reason = %reason, "command could not be launched")
        }
    }
}
