// src/pipeline/mod.rs

//! The static description of what runs on each trigger.
//!
//! A [`Pipeline`] is an ordered list of [`ExecutionGroup`]s. Groups run one
//! after another; commands inside a group run concurrently. The structure
//! is immutable after construction and shared between runs.

pub mod builder;
pub mod command;
pub mod group;

pub use builder::PipelineSpec;
pub use command::{Command, CommandOutcome, CommandState};
pub use group::ExecutionGroup;

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    groups: Vec<ExecutionGroup>,
}

impl Pipeline {
    pub fn new(groups: Vec<ExecutionGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[ExecutionGroup] {
        &self.groups
    }

    /// Total number of commands across all groups.
    pub fn command_count(&self) -> usize {
        self.groups.iter().map(ExecutionGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
