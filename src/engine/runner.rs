// src/engine/runner.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::engine::core::RunnerCore;
use crate::engine::execution::run_pipeline;
use crate::engine::report::{RunNotice, RunOutcome};
use crate::engine::{CoreCommand, Generation, Preemption, RunnerEvent, TriggerReason};
use crate::errors::Result;
use crate::exec::CommandExecutor;
use crate::pipeline::Pipeline;
use crate::types::FailurePolicy;

/// Notices buffered per subscriber before it starts lagging.
pub const NOTICE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunnerOptions {
    pub policy: FailurePolicy,
}

/// Cloneable entry point to a running [`Runner`].
///
/// All calls return immediately; the runner serializes them on its own task.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    events: mpsc::UnboundedSender<RunnerEvent>,
    notices: broadcast::Sender<RunNotice>,
    generation: watch::Receiver<Generation>,
}

impl RunnerHandle {
    /// Request a fresh run, preempting the one in flight.
    ///
    /// Returns `false` if the runner has stopped.
    pub fn trigger(&self, reason: TriggerReason) -> bool {
        self.events.send(RunnerEvent::Triggered { reason }).is_ok()
    }

    /// Preempt the active run and stop the runner.
    pub fn shutdown(&self) -> bool {
        self.events.send(RunnerEvent::ShutdownRequested).is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunNotice> {
        self.notices.subscribe()
    }

    /// Latest generation published by the runner.
    pub fn generation(&self) -> Generation {
        *self.generation.borrow()
    }
}

/// Owns the single in-flight pipeline run.
///
/// This is the IO shell around [`RunnerCore`]: it reads events, feeds them
/// to the core, publishes the resulting generation, and then carries out the
/// core's commands in order. Preempting a run waits for its processes to
/// exit, so the next run never overlaps with the previous one.
pub struct Runner<E: CommandExecutor> {
    core: RunnerCore,
    pipeline: Arc<Pipeline>,
    executor: Arc<E>,
    options: RunnerOptions,
    events: mpsc::UnboundedReceiver<RunnerEvent>,
    completions_tx: mpsc::UnboundedSender<RunnerEvent>,
    completions: mpsc::UnboundedReceiver<RunnerEvent>,
    generation: watch::Sender<Generation>,
    notices: broadcast::Sender<RunNotice>,
    active: Option<(Generation, JoinHandle<RunOutcome>)>,
}

impl<E: CommandExecutor> fmt::Debug for Runner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("core", &self.core)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E: CommandExecutor> Runner<E> {
    pub fn new(pipeline: Pipeline, executor: Arc<E>, options: RunnerOptions) -> (Self, RunnerHandle) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (generation, generation_rx) = watch::channel(0);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        let handle = RunnerHandle {
            events: events_tx,
            notices: notices.clone(),
            generation: generation_rx,
        };

        let runner = Self {
            core: RunnerCore::new(),
            pipeline: Arc::new(pipeline),
            executor,
            options,
            events,
            completions_tx,
            completions,
            generation,
            notices,
            active: None,
        };

        (runner, handle)
    }

    /// Run the actor on its own task.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    /// Main event loop.
    ///
    /// Stops after a shutdown request, or once every [`RunnerHandle`] is
    /// dropped.
    pub async fn run(mut self) -> Result<()> {
        debug!(
            groups = self.pipeline.groups().len(),
            commands = self.pipeline.command_count(),
            "runner started"
        );

        loop {
            let event = tokio::select! {
                biased;
                Some(event) = self.completions.recv() => event,
                event = self.events.recv() => match event {
                    Some(event) => event,
                    None => {
                        debug!("all runner handles dropped; shutting down");
                        RunnerEvent::ShutdownRequested
                    }
                },
            };

            trace!(?event, "runner received event");

            let step = self.core.step(event);
            self.generation.send_replace(self.core.generation());

            for command in step.commands {
                self.execute_command(command).await;
            }

            if !step.keep_running {
                break;
            }
        }

        debug!("runner stopped");
        Ok(())
    }

    async fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::Preempt { generation } => self.preempt(generation).await,
            CoreCommand::StartRun { generation, .. } => self.start_run(generation),
            CoreCommand::Report {
                generation,
                outcome,
            } => self.report(generation, outcome),
        }
    }

    /// Wait for the preempted run to wind down.
    ///
    /// The new generation is already published, so every command of the old
    /// run is terminating; joining the task means its processes are gone.
    async fn preempt(&mut self, generation: Generation) {
        let Some((active, handle)) = self.active.take() else {
            return;
        };
        if active != generation {
            warn!(active, generation, "preempting a run the core does not consider active");
        }

        match handle.await {
            Ok(outcome) => {
                debug!(generation = active, ?outcome, "previous run discarded");
            }
            Err(e) => warn!(generation = active, error = %e, "run task failed"),
        }
        let _ = self.notices.send(RunNotice::RunPreempted { generation: active });
    }

    fn start_run(&mut self, generation: Generation) {
        let preemption = Preemption::new(generation, self.generation.subscribe());
        let pipeline = Arc::clone(&self.pipeline);
        let executor = Arc::clone(&self.executor);
        let notices = self.notices.clone();
        let completions = self.completions_tx.clone();
        let policy = self.options.policy;

        let handle = tokio::spawn(async move {
            let outcome = run_pipeline(pipeline, executor, preemption, policy, notices).await;
            let _ = completions.send(RunnerEvent::RunFinished {
                generation,
                outcome: outcome.clone(),
            });
            outcome
        });

        self.active = Some((generation, handle));
    }

    fn report(&mut self, generation: Generation, outcome: RunOutcome) {
        if matches!(self.active, Some((active, _)) if active == generation) {
            self.active = None;
        }

        match &outcome {
            RunOutcome::Completed(report) if report.all_succeeded() => {
                info!(generation, "pipeline finished");
            }
            RunOutcome::Completed(report) => {
                warn!(generation, failed = report.failures(), "pipeline finished with failures");
            }
            RunOutcome::Aborted { report, group } => {
                warn!(
                    generation,
                    group = *group,
                    failed = report.failures(),
                    "pipeline aborted after failed group"
                );
            }
            RunOutcome::Preempted => debug!(generation, "pipeline run preempted"),
        }

        let _ = self.notices.send(RunNotice::RunFinished {
            generation,
            outcome,
        });
    }
}
