// src/pipeline/builder.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::{Result, WatchpipeError};
use crate::pipeline::command::Command;
use crate::pipeline::group::ExecutionGroup;
use crate::pipeline::Pipeline;
use crate::types::Verbosity;

/// Textual description of a pipeline, as produced by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    /// One entry per execution group; commands inside are joined by `delimiter`.
    pub groups: Vec<String>,
    pub delimiter: String,
    /// Appended to the last command of the final group.
    pub trailing_args: Vec<String>,
    pub environment: BTreeMap<String, String>,
    /// Absolute working directory shared by every command.
    pub directory: PathBuf,
    pub verbosity: Verbosity,
}

impl Pipeline {
    /// Parse every group of `spec` into commands.
    ///
    /// Fails if a group or any command inside it is empty, or if a command
    /// line cannot be split (unbalanced quotes).
    pub fn from_spec(spec: &PipelineSpec) -> Result<Self> {
        if spec.groups.is_empty() {
            return Err(WatchpipeError::ConfigError(
                "at least one execution group is required".to_string(),
            ));
        }

        let mut groups = Vec::with_capacity(spec.groups.len());
        for (index, text) in spec.groups.iter().enumerate() {
            let mut commands = Vec::new();
            for part in text.split(spec.delimiter.as_str()) {
                if part.trim().is_empty() {
                    return Err(WatchpipeError::ConfigError(format!(
                        "execution group {} contains an empty command: '{}'",
                        index + 1,
                        text
                    )));
                }
                let command = Command::parse(part.trim(), spec.directory.clone())?
                    .with_environment(&spec.environment)
                    .verbosity(spec.verbosity);
                commands.push(command);
            }
            groups.push(commands);
        }

        if !spec.trailing_args.is_empty()
            && let Some(last) = groups.last_mut().and_then(|g| g.last_mut())
        {
            *last = last.clone().with_args(spec.trailing_args.iter().cloned());
            debug!(command = %last, "appended trailing arguments");
        }

        Ok(Pipeline::new(
            groups.into_iter().map(ExecutionGroup::new).collect(),
        ))
    }
}
