use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use watchpipe::engine::{Generation, Preemption};
use watchpipe::exec::{CommandExecutor, ExecuteFuture};
use watchpipe::pipeline::{Command, CommandOutcome};

/// Behaviour of one scripted command.
#[derive(Debug, Clone)]
pub enum Script {
    /// Run for `duration`, then exit with `code`.
    Run { duration: Duration, code: i32 },
    /// Fail before starting.
    LaunchFailure(String),
}

impl Default for Script {
    fn default() -> Self {
        Script::Run {
            duration: Duration::from_millis(10),
            code: 0,
        }
    }
}

/// What the fake executor observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started {
        command: String,
        generation: Generation,
    },
    Finished {
        command: String,
        generation: Generation,
        outcome: CommandOutcome,
    },
}

/// A fake executor that:
/// - sleeps or fails according to a per-application script
/// - stops early with `Terminated` when the run is preempted
/// - records every start and finish
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    log: Arc<Mutex<Vec<ExecEvent>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(self, application: &str, duration: Duration, code: i32) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(application.to_string(), Script::Run { duration, code });
        self
    }

    pub fn fail_launch(self, application: &str) -> Self {
        self.scripts.lock().unwrap().insert(
            application.to_string(),
            Script::LaunchFailure(format!("no such program: {application}")),
        );
        self
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.log.lock().unwrap().clone()
    }

    /// `(command, generation)` of every start, in order.
    pub fn started(&self) -> Vec<(String, Generation)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started {
                    command,
                    generation,
                } => Some((command, generation)),
                ExecEvent::Finished { .. } => None,
            })
            .collect()
    }

    /// `(command, generation, outcome)` of every finish, in order.
    pub fn finished(&self) -> Vec<(String, Generation, CommandOutcome)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Finished {
                    command,
                    generation,
                    outcome,
                } => Some((command, generation, outcome)),
                ExecEvent::Started { .. } => None,
            })
            .collect()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, command: Arc<Command>, mut preemption: Preemption) -> ExecuteFuture {
        let name = command.application().to_string();
        let generation = preemption.generation();
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or_default();
        let log = Arc::clone(&self.log);

        Box::pin(async move {
            if preemption.is_preempted() {
                return CommandOutcome::Terminated;
            }

            let (duration, code) = match script {
                Script::LaunchFailure(reason) => {
                    let outcome = CommandOutcome::LaunchFailed(reason);
                    log.lock().unwrap().push(ExecEvent::Finished {
                        command: name,
                        generation,
                        outcome: outcome.clone(),
                    });
                    return outcome;
                }
                Script::Run { duration, code } => (duration, code),
            };

            log.lock().unwrap().push(ExecEvent::Started {
                command: name.clone(),
                generation,
            });

            let outcome = tokio::select! {
                _ = tokio::time::sleep(duration) => CommandOutcome::Exited(code),
                _ = preemption.preempted() => CommandOutcome::Terminated,
            };

            log.lock().unwrap().push(ExecEvent::Finished {
                command: name,
                generation,
                outcome: outcome.clone(),
            });
            outcome
        })
    }
}
