// src/engine/mod.rs

//! Pipeline runner for watchpipe.
//!
//! This module ties together:
//! - the generation counter that orders triggers
//! - the pure core state machine deciding what to preempt and start ([`core`])
//! - the async runner actor owning the in-flight run ([`runner`])
//! - the walk over execution groups for one generation ([`execution`])

use std::fmt;

/// Monotonically increasing identifier of a trigger-initiated run.
pub type Generation = u64;

/// Why a run was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Initial run when watching starts.
    Startup,
    /// A batch of filesystem changes was flushed.
    FileChange { changes: usize },
    /// Explicit request, e.g. `--once` or a test.
    Manual,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::Startup => f.write_str("startup"),
            TriggerReason::FileChange { changes } => write!(f, "{changes} file change(s)"),
            TriggerReason::Manual => f.write_str("manual"),
        }
    }
}

/// Events flowing into the runner from handles and finished runs.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    Triggered { reason: TriggerReason },
    RunFinished {
        generation: Generation,
        outcome: RunOutcome,
    },
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod execution;
pub mod preemption;
pub mod report;
pub mod runner;

pub use core::RunnerCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use execution::run_pipeline;
pub use preemption::Preemption;
pub use report::{GroupReport, RunNotice, RunOutcome, RunReport};
pub use runner::{Runner, RunnerHandle, RunnerOptions};
