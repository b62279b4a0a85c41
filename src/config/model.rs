// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::types::FailurePolicy;

/// Optional configuration file, read from TOML.
///
/// ```toml
/// [watch]
/// directory = "."
/// extensions = ["go", "Makefile"]
/// ignore = ["bin", "vendor"]
/// rate = "2s"
///
/// [pipeline]
/// groups = ["go mod vendor", "go build -o bin/app", "bin/app"]
/// delimiter = ","
/// arguments = ["--port", "8080"]
/// failure_policy = "continue"
/// grace_period = "3s"
///
/// [pipeline.env]
/// APP_ENV = "development"
/// ```
///
/// Every field is optional; command-line flags take precedence over the
/// file and built-in defaults fill whatever neither provides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Root directory to watch, relative to the config file.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Extensions (without leading dot) or exact file names to react to.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,

    /// Names matched against every path segment.
    #[serde(default)]
    pub ignore: Option<Vec<String>>,

    /// Batch window, e.g. `"2s"`.
    #[serde(default)]
    pub rate: Option<String>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSection {
    /// Execution groups, each a delimiter-separated list of commands.
    #[serde(default)]
    pub groups: Option<Vec<String>>,

    #[serde(default)]
    pub delimiter: Option<String>,

    /// Working directory for commands, relative to the config file.
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Appended to the last command of the final group.
    #[serde(default)]
    pub arguments: Option<Vec<String>>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub failure_policy: Option<FailurePolicy>,

    #[serde(default)]
    pub grace_period: Option<String>,
}
