// src/watch/watcher.rs

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, Watcher as _};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::WatchSettings;
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::collector::ChangeCollector;
use crate::watch::event::WatcherEvent;
use crate::watch::filter::EventFilter;

/// Recursive directory watcher with fixed-window batching.
///
/// Set up with [`Watcher::recursively_watch`], then hand it to
/// [`Watcher::begin_watch`], which moves it onto a background task.
pub struct Watcher {
    collector: ChangeCollector,
    refresh_rate: Duration,
    raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("collector", &self.collector)
            .field("refresh_rate", &self.refresh_rate)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    pub fn new(filter: EventFilter, refresh_rate: Duration) -> Result<Self> {
        Self::with_fs(filter, refresh_rate, Arc::new(RealFileSystem))
    }

    pub fn from_settings(settings: &WatchSettings) -> Result<Self> {
        Self::new(EventFilter::from_settings(settings), settings.refresh_rate)
    }

    pub fn with_fs(
        filter: EventFilter,
        refresh_rate: Duration,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        // Channel from the blocking notify callback into the async world.
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let backend = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // The receiver only goes away when watching has stopped.
                let _ = raw_tx.send(res);
            },
            Config::default(),
        )?;

        Ok(Self {
            collector: ChangeCollector::new(filter, fs, Box::new(backend)),
            refresh_rate,
            raw_rx,
        })
    }

    /// Watch `root` and every non-ignored directory beneath it.
    ///
    /// Fails with [`crate::errors::WatchpipeError::WatchSetup`] if `root`
    /// does not exist or cannot be watched.
    pub fn recursively_watch(&mut self, root: &Path) -> Result<usize> {
        let added = self.collector.watch_root(root)?;
        info!(
            root = %root.display(),
            directories = self.collector.registry().len(),
            "watching for changes"
        );
        Ok(added)
    }

    pub fn collector(&self) -> &ChangeCollector {
        &self.collector
    }

    /// Start the batching loop.
    ///
    /// `handler` is called with every non-empty batch, once per window at
    /// most. Returning `ControlFlow::Break` stops the loop, as does stopping
    /// or dropping the returned handle.
    pub fn begin_watch<F>(self, handler: F) -> WatchHandle
    where
        F: FnMut(Vec<WatcherEvent>) -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.batch_loop(handler, stop_rx));
        WatchHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    async fn batch_loop<F>(mut self, mut handler: F, mut stop_rx: oneshot::Receiver<()>)
    where
        F: FnMut(Vec<WatcherEvent>) -> ControlFlow<()> + Send + 'static,
    {
        let mut ticker = tokio::time::interval(self.refresh_rate);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    debug!("watch stop requested");
                    break;
                }
                raw = self.raw_rx.recv() => match raw {
                    Some(Ok(event)) => {
                        for change in WatcherEvent::from_notify(&event) {
                            self.collector.ingest(change);
                        }
                    }
                    Some(Err(err)) => warn!(error = %err, "file watch error"),
                    None => {
                        debug!("notify channel closed");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if let Some(batch) = self.collector.flush() {
                        debug!(events = batch.len(), "flushing change batch");
                        if handler(batch).is_break() {
                            debug!("batch handler requested stop");
                            break;
                        }
                    }
                }
            }
        }

        debug!("watcher event loop finished");
    }
}

/// Completion signal of a running watch.
///
/// Dropping the handle stops the batching loop and releases every OS watch.
#[derive(Debug)]
pub struct WatchHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WatchHandle {
    /// Wait until the batching loop ends. Cancel safe.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.as_mut() {
            if let Err(e) = task.await {
                warn!(error = %e, "watch task failed");
            }
            self.task = None;
        }
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        self.wait().await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}
