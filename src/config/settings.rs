// src/config/settings.rs

//! Merging of CLI flags, config file and built-in defaults.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::duration::parse_duration;
use crate::config::model::ConfigFile;
use crate::logging;
use crate::pipeline::PipelineSpec;
use crate::types::{FailurePolicy, Verbosity};

/// Delimiter splitting an execution group into commands.
pub const DEFAULT_DELIMITER: &str = ",";

/// Extensions (or exact file names) watched when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["go", "Makefile"];

/// Names ignored when none are configured.
pub const DEFAULT_IGNORED_NAMES: &[&str] = &["bin", "vendor"];

/// Batch window for filesystem events.
pub const DEFAULT_REFRESH_RATE: Duration = Duration::from_secs(2);

/// Time a terminated command gets before it is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Build output, relative to the watch directory, used by the default groups.
pub const DEFAULT_BUILD_OUTPUT: &str = "bin/app";

/// Watcher parameters after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub root: PathBuf,
    pub extensions: BTreeSet<String>,
    pub ignored_names: BTreeSet<String>,
    pub refresh_rate: Duration,
}

/// Fully resolved, validated settings for one `watchpipe` process.
///
/// Build via [`crate::config::load_and_validate`] or `Settings::try_from`.
#[derive(Debug, Clone)]
pub struct Settings {
    pub watch: WatchSettings,
    pub pipeline: PipelineSpec,
    pub policy: FailurePolicy,
    pub grace_period: Duration,
}

/// Merged but not yet validated values.
///
/// Paths are already absolute; everything else is exactly what the user (or
/// the defaults) supplied.
#[derive(Debug, Clone)]
pub struct RawSettings {
    pub watch_dir: PathBuf,
    pub work_dir: PathBuf,
    pub groups: Vec<String>,
    pub delimiter: String,
    pub extensions: Vec<String>,
    pub ignored_names: Vec<String>,
    pub refresh_rate: std::result::Result<Duration, String>,
    pub grace_period: std::result::Result<Duration, String>,
    pub env: Vec<String>,
    pub arguments: Vec<String>,
    pub policy: FailurePolicy,
    pub verbosity: Verbosity,
}

impl RawSettings {
    /// Merge CLI > config file > defaults.
    ///
    /// `base_dir` resolves relative paths from the file, `cwd` those from
    /// the command line.
    pub fn merge(args: &CliArgs, file: &ConfigFile, base_dir: &Path, cwd: &Path) -> Self {
        let level = logging::effective_level(args.requested_log_level());
        let verbosity = logging::verbosity_for(level);

        let watch_dir = args
            .watch
            .as_ref()
            .map(|p| cwd.join(p))
            .or_else(|| file.watch.directory.as_ref().map(|p| base_dir.join(p)))
            .unwrap_or_else(|| cwd.to_path_buf());

        let work_dir = args
            .workdir
            .as_ref()
            .map(|p| cwd.join(p))
            .or_else(|| file.pipeline.workdir.as_ref().map(|p| base_dir.join(p)))
            .unwrap_or_else(|| watch_dir.clone());

        let groups = if !args.exec.is_empty() {
            args.exec.clone()
        } else if let Some(groups) = &file.pipeline.groups {
            groups.clone()
        } else {
            let output = args.output.as_deref().unwrap_or(DEFAULT_BUILD_OUTPUT);
            default_groups(&watch_dir.join(output), args.test, verbosity)
        };

        let refresh_rate = match (args.rate, &file.watch.rate) {
            (Some(rate), _) => Ok(rate),
            (None, Some(text)) => parse_duration(text),
            (None, None) => Ok(DEFAULT_REFRESH_RATE),
        };

        let grace_period = match (args.grace_period, &file.pipeline.grace_period) {
            (Some(grace), _) => Ok(grace),
            (None, Some(text)) => parse_duration(text),
            (None, None) => Ok(DEFAULT_GRACE_PERIOD),
        };

        // File entries first so that `--env` wins for duplicate keys.
        let mut env: Vec<String> = file
            .pipeline
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        env.extend(args.env.iter().cloned());

        let arguments = if !args.arguments.is_empty() {
            args.arguments.clone()
        } else {
            file.pipeline.arguments.clone().unwrap_or_default()
        };

        let policy = if args.strict {
            FailurePolicy::Strict
        } else {
            file.pipeline.failure_policy.unwrap_or_default()
        };

        Self {
            watch_dir,
            work_dir,
            groups,
            delimiter: args
                .exec_delim
                .clone()
                .or_else(|| file.pipeline.delimiter.clone())
                .unwrap_or_else(|| DEFAULT_DELIMITER.to_string()),
            extensions: args
                .exts
                .clone()
                .or_else(|| file.watch.extensions.clone())
                .unwrap_or_else(|| to_strings(DEFAULT_EXTENSIONS)),
            ignored_names: args
                .ignore
                .clone()
                .or_else(|| file.watch.ignore.clone())
                .unwrap_or_else(|| to_strings(DEFAULT_IGNORED_NAMES)),
            refresh_rate,
            grace_period,
            env,
            arguments,
            policy,
            verbosity,
        }
    }
}

/// Execution groups used when neither flags nor the config file name any:
/// vendor dependencies, build, then run the binary (or the tests).
pub fn default_groups(output: &Path, test_mode: bool, verbosity: Verbosity) -> Vec<String> {
    let output = shell_words::quote(&output.to_string_lossy()).into_owned();
    let last = if test_mode {
        let mut test_flags = "-coverprofile c.out".to_string();
        if verbosity == Verbosity::Verbose {
            test_flags = format!("-v {test_flags}");
        }
        format!("go test ./... {test_flags}")
    } else {
        output.clone()
    };

    vec![
        "go mod vendor".to_string(),
        format!("go build -o {output}"),
        last,
    ]
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
