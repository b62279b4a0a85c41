// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Registering a non-recursive watch on every directory of the tree,
//!   including directories created later, and skipping ignored names.
//! - Filtering raw `notify` events by ignored names and extensions.
//! - Coalescing the survivors into one batch per refresh window.
//!
//! It does **not** know about pipelines; a batch is only a signal that
//! something changed.

pub mod batch;
pub mod collector;
pub mod event;
pub mod filter;
pub mod path_utils;
pub mod registry;
pub mod watcher;

pub use batch::EventBatcher;
pub use collector::ChangeCollector;
pub use event::{ChangeKind, WatcherEvent};
pub use filter::EventFilter;
pub use registry::{WatchBackend, WatchRegistry};
pub use watcher::{WatchHandle, Watcher};
