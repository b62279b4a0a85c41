// src/config/validate.rs

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::settings::{RawSettings, Settings, WatchSettings};
use crate::errors::{Result, WatchpipeError};
use crate::pipeline::PipelineSpec;

impl TryFrom<RawSettings> for Settings {
    type Error = WatchpipeError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        ensure_has_groups(&raw)?;
        ensure_delimiter(&raw)?;

        let extensions = normalize_extensions(&raw.extensions)?;
        let ignored_names = normalize_names(&raw.ignored_names);
        let environment = parse_env(&raw.env)?;

        let refresh_rate = raw.refresh_rate.clone().map_err(|e| {
            WatchpipeError::ConfigError(format!("invalid refresh rate: {e}"))
        })?;
        if refresh_rate.is_zero() {
            return Err(WatchpipeError::ConfigError(
                "refresh rate must be greater than zero".to_string(),
            ));
        }

        let grace_period = raw.grace_period.clone().map_err(|e| {
            WatchpipeError::ConfigError(format!("invalid grace period: {e}"))
        })?;

        let directory = resolve_work_dir(&raw.work_dir)?;

        // The watch root is deliberately not checked here: a missing root is
        // a watch setup failure, reported when the watcher registers it.
        let root = raw
            .watch_dir
            .canonicalize()
            .unwrap_or_else(|_| raw.watch_dir.clone());

        Ok(Settings {
            watch: WatchSettings {
                root,
                extensions,
                ignored_names,
                refresh_rate,
            },
            pipeline: PipelineSpec {
                groups: raw.groups,
                delimiter: raw.delimiter,
                trailing_args: raw.arguments,
                environment,
                directory,
                verbosity: raw.verbosity,
            },
            policy: raw.policy,
            grace_period,
        })
    }
}

fn ensure_has_groups(raw: &RawSettings) -> Result<()> {
    if raw.groups.is_empty() {
        return Err(WatchpipeError::ConfigError(
            "at least one execution group is required".to_string(),
        ));
    }
    for (index, group) in raw.groups.iter().enumerate() {
        if group.trim().is_empty() {
            return Err(WatchpipeError::ConfigError(format!(
                "execution group {} is empty",
                index + 1
            )));
        }
    }
    Ok(())
}

fn ensure_delimiter(raw: &RawSettings) -> Result<()> {
    if raw.delimiter.is_empty() {
        return Err(WatchpipeError::ConfigError(
            "command delimiter must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Trim entries and strip a leading dot, so `.go` and `go` are equivalent.
fn normalize_extensions(raw: &[String]) -> Result<BTreeSet<String>> {
    let set: BTreeSet<String> = raw
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect();

    if set.is_empty() {
        return Err(WatchpipeError::ConfigError(
            "at least one file extension to watch is required".to_string(),
        ));
    }
    Ok(set)
}

fn normalize_names(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Parse `KEY=VALUE` entries. Later entries win for duplicate keys.
fn parse_env(entries: &[String]) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for entry in entries {
        match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                env.insert(key.trim().to_string(), value.to_string());
            }
            _ => {
                return Err(WatchpipeError::ConfigError(format!(
                    "invalid environment entry '{entry}' (expected KEY=VALUE)"
                )));
            }
        }
    }
    Ok(env)
}

fn resolve_work_dir(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(WatchpipeError::ConfigError(format!(
            "working directory '{}' does not exist",
            path.display()
        )));
    }
    Ok(path.canonicalize()?)
}
