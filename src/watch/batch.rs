// src/watch/batch.rs

use std::collections::HashSet;

use crate::watch::event::WatcherEvent;

/// Pending events of the current batch window.
///
/// Keeps arrival order and drops exact duplicates (same path and kind), so
/// an editor writing a file three times yields one event.
#[derive(Debug, Default)]
pub struct EventBatcher {
    pending: Vec<WatcherEvent>,
    seen: HashSet<WatcherEvent>,
}

impl EventBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event`. Returns `false` if it duplicates a pending one.
    pub fn push(&mut self, event: WatcherEvent) -> bool {
        if !self.seen.insert(event.clone()) {
            return false;
        }
        self.pending.push(event);
        true
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the whole window at once. `None` when nothing is pending.
    pub fn flush(&mut self) -> Option<Vec<WatcherEvent>> {
        if self.pending.is_empty() {
            return None;
        }
        self.seen.clear();
        Some(std::mem::take(&mut self.pending))
    }
}
