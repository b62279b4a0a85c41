// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File,
    Dir(BTreeSet<String>), // child names
}

/// In-memory tree keyed by absolute path.
///
/// Parents are created implicitly. Cloning shares the tree, so a test can
/// keep mutating it after handing a clone to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.lock();
        ensure_dir(&mut entries, path.as_ref());
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.lock();
        if let Some(parent) = path.parent() {
            ensure_dir(&mut entries, parent);
            link_child(&mut entries, parent, path);
        }
        entries.insert(path.to_path_buf(), MockEntry::File);
    }

    /// Remove `path` and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.lock();
        entries.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
                children.remove(&*name.to_string_lossy());
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn ensure_dir(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(BTreeSet::new()));
    if let Some(parent) = path.parent() {
        ensure_dir(entries, parent);
        link_child(entries, parent, path);
    }
}

fn link_child(entries: &mut BTreeMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let (Some(MockEntry::Dir(children)), Some(name)) =
        (entries.get_mut(parent), child.file_name())
    {
        children.insert(name.to_string_lossy().into_owned());
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Tests use absolute paths; existence is the only check.
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(anyhow!("No such file or directory: {:?}", path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lock().get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
