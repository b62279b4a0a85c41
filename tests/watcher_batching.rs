mod common;
use crate::common::{write_tree, TestResult};

use std::fs;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::tempdir;
use tokio::sync::mpsc;
use tokio::time::timeout;

use watchpipe::errors::WatchpipeError;
use watchpipe::watch::{EventFilter, Watcher, WatcherEvent};
use watchpipe_test_utils::init_tracing;

const RATE: Duration = Duration::from_millis(300);

fn go_watcher() -> watchpipe::errors::Result<Watcher> {
    Watcher::new(EventFilter::new(["go"], ["vendor"]), RATE)
}

/// Collect every batch delivered within `window`.
async fn batches_within(
    rx: &mut mpsc::UnboundedReceiver<Vec<WatcherEvent>>,
    window: Duration,
) -> Vec<Vec<WatcherEvent>> {
    let mut batches = Vec::new();
    let _ = timeout(window, async {
        while let Some(batch) = rx.recv().await {
            batches.push(batch);
        }
    })
    .await;
    batches
}

fn forward_batches(
    tx: mpsc::UnboundedSender<Vec<WatcherEvent>>,
) -> impl FnMut(Vec<WatcherEvent>) -> ControlFlow<()> + Send + 'static {
    move |batch| {
        if tx.send(batch).is_ok() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

#[tokio::test]
async fn one_burst_yields_one_batch_with_only_matching_paths() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    fs::create_dir_all(root.join("vendor/pkg"))?;

    let mut watcher = go_watcher()?;
    watcher.recursively_watch(&root)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = watcher.begin_watch(forward_batches(tx));

    write_tree(&root, &["main.go", "vendor/pkg/x.go", "README.md"])?;

    let batches = batches_within(&mut rx, Duration::from_secs(2)).await;
    assert_eq!(batches.len(), 1, "expected exactly one batch, got {batches:?}");
    let paths: Vec<PathBuf> = batches[0].iter().map(|e| e.path.clone()).collect();
    assert!(!paths.is_empty());
    assert!(paths.iter().all(|p| p == &root.join("main.go")), "{paths:?}");

    handle.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn ignored_only_changes_never_reach_the_handler() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    fs::create_dir_all(root.join("vendor/pkg"))?;

    let mut watcher = go_watcher()?;
    watcher.recursively_watch(&root)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = watcher.begin_watch(forward_batches(tx));

    write_tree(&root, &["vendor/pkg/x.go", "notes.txt"])?;

    let batches = batches_within(&mut rx, Duration::from_secs(1)).await;
    assert!(batches.is_empty(), "unexpected batches: {batches:?}");

    handle.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn directories_created_after_start_are_watched() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;

    let mut watcher = go_watcher()?;
    watcher.recursively_watch(&root)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = watcher.begin_watch(forward_batches(tx));

    // The file lands before the new directories can be watched.
    fs::create_dir_all(root.join("internal/auth"))?;
    write_tree(&root, &["internal/auth/token.go"])?;

    let target = root.join("internal/auth/token.go");
    let batches = batches_within(&mut rx, Duration::from_secs(2)).await;
    assert!(
        batches.iter().flatten().any(|e| e.path == target),
        "no event for {target:?} in {batches:?}"
    );

    handle.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn missing_root_fails_setup() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = go_watcher()?;

    match watcher.recursively_watch(&dir.path().join("missing")) {
        Err(WatchpipeError::WatchSetup { .. }) => Ok(()),
        other => Err(format!("expected WatchSetup, got {other:?}").into()),
    }
}

#[tokio::test]
async fn handler_break_and_shutdown_end_the_loop() -> TestResult {
    init_tracing();
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;

    let mut watcher = go_watcher()?;
    watcher.recursively_watch(&root)?;
    let mut handle = watcher.begin_watch(|_batch| ControlFlow::Break(()));

    write_tree(&root, &["main.go"])?;
    timeout(Duration::from_secs(3), handle.wait()).await?;
    assert!(handle.is_finished());

    let mut idle = go_watcher()?;
    idle.recursively_watch(&root)?;
    let handle = idle.begin_watch(|_batch| ControlFlow::Continue(()));
    timeout(Duration::from_secs(1), handle.shutdown()).await?;
    Ok(())
}
