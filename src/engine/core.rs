// src/engine/core.rs

//! Pure core runner state machine.
//!
//! This module contains a synchronous, deterministic "core runner" that
//! consumes [`RunnerEvent`]s and produces:
//! - an updated generation / active-run state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runner::Runner`) is responsible for reading
//! events from channels, spawning pipeline runs, and terminating preempted
//! ones. The core can be unit tested without Tokio, channels or processes.
//!
//! [`CoreCommand`]: crate::engine::CoreCommand

use crate::engine::event_handlers::{
    handle_run_finished, handle_shutdown, handle_trigger, CoreStep,
};
use crate::engine::{Generation, RunnerEvent};

/// Pure core runner state.
///
/// `generation` only ever grows. `active` is the generation whose run is
/// in flight, if any.
#[derive(Debug, Default)]
pub struct RunnerCore {
    generation: Generation,
    active: Option<Generation>,
    stopped: bool,
}

impl RunnerCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn active(&self) -> Option<Generation> {
        self.active
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Handle a single runner event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RunnerEvent) -> CoreStep {
        if self.stopped {
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        match event {
            RunnerEvent::Triggered { reason } => {
                handle_trigger(&mut self.generation, &mut self.active, reason)
            }
            RunnerEvent::RunFinished {
                generation,
                outcome,
            } => handle_run_finished(&mut self.active, generation, outcome),
            RunnerEvent::ShutdownRequested => {
                self.stopped = true;
                handle_shutdown(&mut self.generation, &mut self.active)
            }
        }
    }
}
