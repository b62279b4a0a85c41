#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use watchpipe::engine::RunNotice;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Create `files` (relative paths) under `root`, with parent directories.
pub fn write_tree(root: &Path, files: &[&str]) -> std::io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for rel in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, b"package main\n")?;
        written.push(path);
    }
    Ok(written)
}

/// Receive notices until `pred` matches, returning everything seen
/// (including the match). Fails after `limit`.
pub async fn collect_until<F>(
    rx: &mut broadcast::Receiver<RunNotice>,
    limit: Duration,
    mut pred: F,
) -> Result<Vec<RunNotice>, Box<dyn std::error::Error>>
where
    F: FnMut(&RunNotice) -> bool,
{
    let mut seen = Vec::new();
    timeout(limit, async {
        loop {
            let notice = rx.recv().await?;
            let done = pred(&notice);
            seen.push(notice);
            if done {
                return Ok::<_, broadcast::error::RecvError>(());
            }
        }
    })
    .await??;
    Ok(seen)
}
