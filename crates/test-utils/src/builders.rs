#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use watchpipe::errors::{Result, WatchpipeError};
use watchpipe::pipeline::{Command, ExecutionGroup, Pipeline, PipelineSpec};
use watchpipe::types::Verbosity;
use watchpipe::watch::WatchBackend;

/// Builder for `Pipeline` where every command is just a name.
///
/// Meant for fake executors, which key their behaviour on the application.
pub struct PipelineBuilder {
    directory: PathBuf,
    groups: Vec<Vec<Command>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            directory: std::env::temp_dir(),
            groups: Vec::new(),
        }
    }

    pub fn group(mut self, names: &[&str]) -> Self {
        let commands = names
            .iter()
            .map(|name| Command::new(*name, self.directory.clone()))
            .collect();
        self.groups.push(commands);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline::new(self.groups.into_iter().map(ExecutionGroup::new).collect())
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PipelineSpec` with `,` as delimiter.
pub struct PipelineSpecBuilder {
    spec: PipelineSpec,
}

impl PipelineSpecBuilder {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            spec: PipelineSpec {
                groups: Vec::new(),
                delimiter: ",".to_string(),
                trailing_args: Vec::new(),
                environment: BTreeMap::new(),
                directory: directory.as_ref().to_path_buf(),
                verbosity: Verbosity::Normal,
            },
        }
    }

    pub fn group(mut self, group: &str) -> Self {
        self.spec.groups.push(group.to_string());
        self
    }

    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.spec.delimiter = delimiter.to_string();
        self
    }

    pub fn trailing(mut self, args: &[&str]) -> Self {
        self.spec.trailing_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.spec
            .environment
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> PipelineSpec {
        self.spec
    }
}

/// What a `RecordingBackend` was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Watch(PathBuf),
    Unwatch(PathBuf),
}

/// `WatchBackend` that only records calls. Paths listed in `failing` are
/// refused.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    calls: Arc<Mutex<Vec<BackendCall>>>,
    failing: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing.lock().unwrap().push(path.into());
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Watch(path) => Some(path),
                BackendCall::Unwatch(_) => None,
            })
            .collect()
    }
}

impl WatchBackend for RecordingBackend {
    fn watch_dir(&mut self, path: &Path) -> Result<()> {
        if self.failing.lock().unwrap().iter().any(|p| p == path) {
            return Err(WatchpipeError::ConfigError(format!(
                "refusing to watch {}",
                path.display()
            )));
        }
        self.calls
            .lock()
            .unwrap()
            .push(BackendCall::Watch(path.to_path_buf()));
        Ok(())
    }

    fn unwatch_dir(&mut self, path: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(BackendCall::Unwatch(path.to_path_buf()));
        Ok(())
    }
}
