// src/watch/event.rs

use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
    Renamed,
}

/// One filtered filesystem change, as handed to the batch handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatcherEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl WatcherEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Split a raw `notify` event into one event per path.
    ///
    /// Access and metadata-only notifications are dropped: opening a file or
    /// touching its permissions is not a source change.
    pub fn from_notify(event: &notify::Event) -> Vec<WatcherEvent> {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Renamed,
            EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
            EventKind::Modify(_) => ChangeKind::Modified,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
        };

        event
            .paths
            .iter()
            .map(|path| WatcherEvent::new(path.clone(), kind))
            .collect()
    }
}
