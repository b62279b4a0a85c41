// src/engine/report.rs

//! What a pipeline run produced, and the notices broadcast while it runs.

use crate::engine::Generation;
use crate::pipeline::CommandOutcome;

/// Outcomes of one execution group, in the group's command order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub index: usize,
    pub outcomes: Vec<(String, CommandOutcome)>,
}

impl GroupReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_failure()).count()
    }

    pub fn has_failure(&self) -> bool {
        self.failures() > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.groups.iter().map(GroupReport::failures).sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures() == 0
    }

    /// Every command outcome across all groups, in execution order.
    pub fn outcomes(&self) -> impl Iterator<Item = &(String, CommandOutcome)> {
        self.groups.iter().flat_map(|g| g.outcomes.iter())
    }
}

/// How one generation's run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every group ran.
    Completed(RunReport),
    /// A group failed under the strict failure policy; later groups were
    /// skipped.
    Aborted { report: RunReport, group: usize },
    /// A newer trigger arrived. The run is discarded, not failed.
    Preempted,
}

impl RunOutcome {
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            RunOutcome::Completed(report) | RunOutcome::Aborted { report, .. } => Some(report),
            RunOutcome::Preempted => None,
        }
    }

    pub fn failures(&self) -> usize {
        self.report().map(RunReport::failures).unwrap_or(0)
    }

    pub fn is_preempted(&self) -> bool {
        matches!(self, RunOutcome::Preempted)
    }
}

/// Lifecycle notices broadcast by the runner.
///
/// Subscribers that lag simply miss notices; the runner never blocks on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunNotice {
    RunStarted {
        generation: Generation,
    },
    GroupStarted {
        generation: Generation,
        group: usize,
    },
    CommandFinished {
        generation: Generation,
        group: usize,
        command: String,
        outcome: CommandOutcome,
    },
    GroupCompleted {
        generation: Generation,
        group: usize,
    },
    RunFinished {
        generation: Generation,
        outcome: RunOutcome,
    },
    RunPreempted {
        generation: Generation,
    },
}
