// src/watch/registry.rs

//! The set of directories currently under watch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use tracing::{debug, trace, warn};

use crate::errors::{Result, WatchpipeError};
use crate::fs::FileSystem;
use crate::watch::filter::EventFilter;
use crate::watch::path_utils::relative_to;

/// Registers single, non-recursive directory watches.
///
/// Each directory is watched on its own so that ignored subtrees are never
/// registered and new directories can be added while running.
pub trait WatchBackend: Send {
    fn watch_dir(&mut self, path: &Path) -> Result<()>;
    fn unwatch_dir(&mut self, path: &Path) -> Result<()>;
}

impl WatchBackend for RecommendedWatcher {
    fn watch_dir(&mut self, path: &Path) -> Result<()> {
        Ok(self.watch(path, RecursiveMode::NonRecursive)?)
    }

    fn unwatch_dir(&mut self, path: &Path) -> Result<()> {
        Ok(self.unwatch(path)?)
    }
}

/// Watched directories keyed by resolved path.
///
/// Registration is idempotent: a path already in the set is skipped along
/// with its subtree, which also stops symlink loops.
#[derive(Debug)]
pub struct WatchRegistry {
    fs: Arc<dyn FileSystem>,
    root: Option<PathBuf>,
    watched: BTreeSet<PathBuf>,
}

impl WatchRegistry {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            root: None,
            watched: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    pub fn watched(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    /// `path` relative to the registered root.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        relative_to(self.root.as_deref()?, path)
    }

    /// Watch `root` and every non-ignored directory beneath it.
    ///
    /// Failing to watch the root itself is a [`WatchpipeError::WatchSetup`];
    /// failures below it are logged and skipped. Returns the number of
    /// directories newly registered.
    pub fn register_root(
        &mut self,
        backend: &mut dyn WatchBackend,
        filter: &EventFilter,
        root: &Path,
    ) -> Result<usize> {
        let setup_error = |reason: String| WatchpipeError::WatchSetup {
            path: root.to_path_buf(),
            reason,
        };

        if !self.fs.exists(root) {
            return Err(setup_error("no such directory".to_string()));
        }
        if !self.fs.is_dir(root) {
            return Err(setup_error("not a directory".to_string()));
        }
        let root = self
            .fs
            .canonicalize(root)
            .map_err(|e| setup_error(e.to_string()))?;

        let mut added = 0;
        if !self.watched.contains(&root) {
            backend
                .watch_dir(&root)
                .map_err(|e| setup_error(e.to_string()))?;
            self.watched.insert(root.clone());
            added += 1;
        }
        self.root = Some(root.clone());

        for child in self.child_dirs(&root) {
            added += self.register_tree(backend, filter, &child).len();
        }
        debug!(root = %root.display(), directories = self.watched.len(), "watching directory tree");
        Ok(added)
    }

    /// Register `dir` and its subdirectories if not already watched.
    ///
    /// Used for the initial walk and for directories created at runtime.
    /// Never fails: directories that cannot be watched are skipped. Returns
    /// the resolved paths newly registered, parents before children.
    pub fn register_tree(
        &mut self,
        backend: &mut dyn WatchBackend,
        filter: &EventFilter,
        dir: &Path,
    ) -> Vec<PathBuf> {
        let mut added = Vec::new();
        let mut stack = vec![dir.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let resolved = match self.fs.canonicalize(&dir) {
                Ok(resolved) => resolved,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "directory vanished before registration");
                    continue;
                }
            };
            if self.watched.contains(&resolved) {
                continue;
            }

            let Some(relative) = self.relative(&resolved) else {
                trace!(dir = %resolved.display(), "skipping directory outside watched root");
                continue;
            };
            if filter.is_ignored(&relative) {
                trace!(dir = %resolved.display(), "skipping ignored directory");
                continue;
            }

            if let Err(e) = backend.watch_dir(&resolved) {
                warn!(dir = %resolved.display(), error = %e, "failed to watch directory; skipping");
                continue;
            }
            trace!(dir = %resolved.display(), "watching directory");
            self.watched.insert(resolved.clone());
            stack.extend(self.child_dirs(&resolved));
            added.push(resolved);
        }

        added
    }

    /// Drop `path` and every watched directory below it.
    ///
    /// Returns the number of directories forgotten. A directory re-created
    /// later is registered again.
    pub fn forget(&mut self, backend: &mut dyn WatchBackend, path: &Path) -> usize {
        let gone: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();

        for dir in &gone {
            self.watched.remove(dir);
            // The OS usually drops the watch of a deleted directory itself.
            if let Err(e) = backend.unwatch_dir(dir) {
                trace!(dir = %dir.display(), error = %e, "unwatch failed");
            }
        }
        if !gone.is_empty() {
            debug!(path = %path.display(), count = gone.len(), "forgot removed directories");
        }
        gone.len()
    }

    fn child_dirs(&self, dir: &Path) -> Vec<PathBuf> {
        self.entries(dir)
            .into_iter()
            .filter(|p| self.fs.is_dir(p))
            .collect()
    }

    /// Plain files directly inside `dir`.
    pub fn files_in(&self, dir: &Path) -> Vec<PathBuf> {
        self.entries(dir)
            .into_iter()
            .filter(|p| !self.fs.is_dir(p))
            .collect()
    }

    fn entries(&self, dir: &Path) -> Vec<PathBuf> {
        match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to list directory");
                Vec::new()
            }
        }
    }
}
