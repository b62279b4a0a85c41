// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::settings::{RawSettings, Settings};
use crate::errors::Result;

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; relative paths inside the file
/// are resolved later against [`config_base_dir`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: ConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Resolve the final [`Settings`] for a run.
///
/// - Reads the `--config` file when one is given.
/// - Merges CLI flags over the file over built-in defaults.
/// - Validates the merged values.
pub fn load_and_validate(args: &CliArgs) -> Result<Settings> {
    let cwd = std::env::current_dir()?;

    let (file, base_dir) = match &args.config {
        Some(path) => (load_from_path(path)?, config_base_dir(path, &cwd)),
        None => (ConfigFile::default(), cwd.clone()),
    };

    let raw = RawSettings::merge(args, &file, &base_dir, &cwd);
    Settings::try_from(raw)
}

/// Directory that relative paths inside a config file are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/watchpipe.toml"),
///   we use that directory.
/// - If it's just a bare filename, we fall back to `cwd`.
pub fn config_base_dir(config_path: &Path, cwd: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => cwd.join(parent),
        _ => cwd.to_path_buf(),
    }
}
