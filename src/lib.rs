// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod types;
pub mod watch;

use std::ops::ControlFlow;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, trace, warn};

use crate::cli::CliArgs;
use crate::config::{Settings, load_and_validate};
use crate::engine::{RunNotice, Runner, RunnerHandle, RunnerOptions, TriggerReason};
use crate::errors::WatchpipeError;
use crate::exec::ProcessExecutor;
use crate::pipeline::Pipeline;
use crate::watch::{Watcher, WatcherEvent};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings resolution (flags, config file, defaults)
/// - the pipeline and its runner
/// - the file watcher feeding runner triggers (skipped in `--once` mode)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_and_validate(&args)?;
    debug!(?settings, "resolved settings");

    let pipeline = Pipeline::from_spec(&settings.pipeline)?;

    if args.dry_run {
        print_dry_run(&settings, &pipeline);
        return Ok(());
    }

    let executor = Arc::new(ProcessExecutor::new(settings.grace_period));
    let options = RunnerOptions {
        policy: settings.policy,
    };
    let (runner, handle) = Runner::new(pipeline, executor, options);
    let runner_task = runner.spawn();

    let result = if args.once {
        run_once(&handle).await
    } else {
        watch_and_run(&settings, &handle).await
    };

    // Terminates whatever is still running before we exit.
    handle.shutdown();
    match runner_task.await {
        Ok(runner_result) => runner_result?,
        Err(e) => warn!(error = %e, "runner task failed"),
    }

    result
}

/// Watch the tree and restart the pipeline on every batch until Ctrl-C.
async fn watch_and_run(settings: &Settings, handle: &RunnerHandle) -> Result<()> {
    let mut watcher = Watcher::from_settings(&settings.watch)?;
    watcher.recursively_watch(&settings.watch.root)?;

    let mut watch = watcher.begin_watch(restart_on_batch(handle.clone()));

    handle.trigger(TriggerReason::Startup);

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            info!("interrupt received; shutting down");
        }
        _ = watch.wait() => {
            info!("watcher stopped; shutting down");
        }
    }

    watch.shutdown().await;
    Ok(())
}

/// Batch handler that restarts the pipeline for every batch.
///
/// Breaks the watch loop once the runner has stopped.
pub fn restart_on_batch(
    handle: RunnerHandle,
) -> impl FnMut(Vec<WatcherEvent>) -> ControlFlow<()> + Send + 'static {
    move |batch| {
        info!(changes = batch.len(), "change detected; restarting pipeline");
        for event in &batch {
            trace!(path = %event.path.display(), kind = ?event.kind, "changed");
        }
        if handle.trigger(TriggerReason::FileChange {
            changes: batch.len(),
        }) {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }
}

/// Run the pipeline a single time and report whether every command passed.
async fn run_once(handle: &RunnerHandle) -> Result<()> {
    let mut notices = handle.subscribe();
    handle.trigger(TriggerReason::Manual);

    let wait_for_run = async {
        loop {
            match notices.recv().await {
                Ok(RunNotice::RunFinished { outcome, .. }) => return Ok(outcome.failures()),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "run notice subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    return Err(anyhow::anyhow!("runner stopped before the run finished"));
                }
            }
        }
    };

    let failed = tokio::select! {
        failed = wait_for_run => failed?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received; shutting down");
            return Ok(());
        }
    };

    if failed > 0 {
        return Err(WatchpipeError::RunFailed { failed }.into());
    }
    Ok(())
}

/// Simple dry-run output: print the resolved watch settings and pipeline.
fn print_dry_run(settings: &Settings, pipeline: &Pipeline) {
    let watch = &settings.watch;
    println!("watchpipe dry-run");
    println!("  watch.root = {}", watch.root.display());
    println!("  watch.extensions = {:?}", watch.extensions);
    println!("  watch.ignore = {:?}", watch.ignored_names);
    println!("  watch.rate = {:?}", watch.refresh_rate);
    println!("  pipeline.workdir = {}", settings.pipeline.directory.display());
    println!("  pipeline.failure_policy = {:?}", settings.policy);
    println!("  pipeline.grace_period = {:?}", settings.grace_period);
    if !settings.pipeline.environment.is_empty() {
        println!("  pipeline.env = {:?}", settings.pipeline.environment);
    }
    println!();

    println!("groups ({}):", pipeline.groups().len());
    for (index, group) in pipeline.groups().iter().enumerate() {
        println!("  {}.", index + 1);
        for command in group.commands() {
            println!("      {command}");
        }
    }

    debug!("dry-run complete (no execution)");
}
