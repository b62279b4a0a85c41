// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Express `path` relative to `root`.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. symlinks, `/private/var` on macOS), the parent of
///   `path` is canonicalized and we try again. The parent is used because a
///   removed file can no longer be canonicalized.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_path_buf());
    }

    let parent = path.parent()?;
    let name = path.file_name()?;
    let parent = parent.canonicalize().ok()?;
    parent
        .join(name)
        .strip_prefix(root)
        .ok()
        .map(Path::to_path_buf)
}

/// Forward-slash rendering of a relative path, for logs.
pub fn display_relative(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
