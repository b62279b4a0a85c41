// src/pipeline/group.rs

use std::sync::Arc;

use crate::pipeline::command::Command;

/// A set of commands started together.
///
/// The group is complete once every member has terminated, successfully or
/// not. Member order only matters for reporting.
#[derive(Debug, Clone, Default)]
pub struct ExecutionGroup {
    commands: Vec<Arc<Command>>,
}

impl ExecutionGroup {
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands: commands.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn commands(&self) -> &[Arc<Command>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
