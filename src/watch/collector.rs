// src/watch/collector.rs

//! Turns raw changes into filtered, batched events.
//!
//! The collector owns everything the watcher's event task mutates: the
//! registration set, the pending batch and the backend that registers
//! directories. It performs no waiting itself, so the whole ingest path can
//! be driven synchronously.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::batch::EventBatcher;
use crate::watch::event::{ChangeKind, WatcherEvent};
use crate::watch::filter::EventFilter;
use crate::watch::path_utils::display_relative;
use crate::watch::registry::{WatchBackend, WatchRegistry};

pub struct ChangeCollector {
    filter: EventFilter,
    fs: Arc<dyn FileSystem>,
    registry: WatchRegistry,
    batcher: EventBatcher,
    backend: Box<dyn WatchBackend>,
}

impl std::fmt::Debug for ChangeCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeCollector")
            .field("filter", &self.filter)
            .field("registry", &self.registry)
            .field("pending", &self.batcher.len())
            .finish_non_exhaustive()
    }
}

impl ChangeCollector {
    pub fn new(filter: EventFilter, fs: Arc<dyn FileSystem>, backend: Box<dyn WatchBackend>) -> Self {
        Self {
            filter,
            registry: WatchRegistry::new(Arc::clone(&fs)),
            fs,
            batcher: EventBatcher::new(),
            backend,
        }
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn pending(&self) -> usize {
        self.batcher.len()
    }

    pub fn watch_root(&mut self, root: &Path) -> Result<usize> {
        self.registry
            .register_root(self.backend.as_mut(), &self.filter, root)
    }

    /// Apply the ignore filter, keep the registration set current, then
    /// queue the event if its extension is watched.
    ///
    /// A newly registered directory may already hold files written before
    /// its watch existed; each accepted one is queued as `Created`.
    ///
    /// Returns whether anything was queued.
    pub fn ingest(&mut self, event: WatcherEvent) -> bool {
        let Some(relative) = self.registry.relative(&event.path) else {
            trace!(path = %event.path.display(), "dropping event outside watched root");
            return false;
        };
        if self.filter.is_ignored(&relative) {
            trace!(path = %display_relative(&relative), "dropping ignored path");
            return false;
        }

        let discovered = self.track_directories(&event);

        if !self.filter.matches_extension(&event.path) {
            trace!(path = %display_relative(&relative), "dropping unwatched extension");
            return discovered;
        }

        trace!(path = %display_relative(&relative), kind = ?event.kind, "queued change");
        self.batcher.push(event) || discovered
    }

    /// Close the current window.
    pub fn flush(&mut self) -> Option<Vec<WatcherEvent>> {
        self.batcher.flush()
    }

    fn track_directories(&mut self, event: &WatcherEvent) -> bool {
        let backend = self.backend.as_mut();
        match event.kind {
            ChangeKind::Created | ChangeKind::Renamed if self.fs.is_dir(&event.path) => {
                let added = self
                    .registry
                    .register_tree(backend, &self.filter, &event.path);
                self.queue_existing_files(&added)
            }
            ChangeKind::Removed | ChangeKind::Renamed => {
                self.registry.forget(backend, &event.path);
                false
            }
            _ => false,
        }
    }

    fn queue_existing_files(&mut self, dirs: &[PathBuf]) -> bool {
        let mut queued = false;
        for dir in dirs {
            for file in self.registry.files_in(dir) {
                let Some(relative) = self.registry.relative(&file) else {
                    continue;
                };
                if !self.filter.accepts(&relative) {
                    continue;
                }
                trace!(path = %display_relative(&relative), "queued file found in new directory");
                queued |= self.batcher.push(WatcherEvent::new(file, ChangeKind::Created));
            }
        }
        queued
    }
}
