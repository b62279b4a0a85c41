// src/config/mod.rs

//! Configuration loading and validation for watchpipe.
//!
//! Responsibilities:
//! - Define the optional TOML config file model (`model.rs`).
//! - Load it from disk and merge it with CLI flags (`loader.rs`, `settings.rs`).
//! - Validate the merged values into [`Settings`] (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, PipelineSection, WatchSection};
pub use settings::{RawSettings, Settings, WatchSettings};
