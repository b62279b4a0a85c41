// src/watch/filter.rs

//! Extension allowlist and name denylist applied to every change.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use crate::config::WatchSettings;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    extensions: BTreeSet<String>,
    ignored_names: BTreeSet<String>,
}

impl EventFilter {
    /// Leading dots on extensions are stripped (`.go` == `go`).
    pub fn new<E, I, S, T>(extensions: E, ignored_names: I) -> Self
    where
        E: IntoIterator<Item = S>,
        I: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_string())
                .collect(),
            ignored_names: ignored_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_settings(settings: &WatchSettings) -> Self {
        Self {
            extensions: settings.extensions.clone(),
            ignored_names: settings.ignored_names.clone(),
        }
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn ignored_names(&self) -> &BTreeSet<String> {
        &self.ignored_names
    }

    /// Case-sensitive match of one path segment against the denylist.
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.ignored_names.contains(name)
    }

    /// True if any segment of `relative` is an ignored name.
    ///
    /// Pass paths relative to the watched root, so that directories above
    /// the root never count.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        relative.components().any(|component| match component {
            Component::Normal(segment) => self.is_ignored_name(&segment.to_string_lossy()),
            _ => false,
        })
    }

    /// True if the extension, or the whole file name, is allowed.
    ///
    /// The file name match covers extensionless files such as `Makefile`.
    pub fn matches_extension(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension()
            && self.extensions.contains(&*ext.to_string_lossy())
        {
            return true;
        }
        path.file_name()
            .is_some_and(|name| self.extensions.contains(&*name.to_string_lossy()))
    }

    /// Both filters at once.
    pub fn accepts(&self, relative: &Path) -> bool {
        !self.is_ignored(relative) && self.matches_extension(relative)
    }
}
