#![cfg(unix)]

mod common;
use crate::common::{collect_until, TestResult};

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use watchpipe::cli::CliArgs;
use watchpipe::engine::{RunNotice, Runner, RunnerOptions};
use watchpipe::errors::WatchpipeError;
use watchpipe::restart_on_batch;
use watchpipe::watch::{ChangeKind, WatcherEvent};
use watchpipe_test_utils::builders::PipelineBuilder;
use watchpipe_test_utils::fake_executor::ScriptedExecutor;
use watchpipe_test_utils::{init_tracing, with_timeout};

fn once_args(root: &std::path::Path, groups: &[&str]) -> CliArgs {
    CliArgs {
        watch: Some(root.to_path_buf()),
        exec: groups.iter().map(|g| g.to_string()).collect(),
        once: true,
        grace_period: Some(Duration::from_millis(200)),
        ..CliArgs::default()
    }
}

#[tokio::test]
async fn once_reports_failed_commands_as_error() -> TestResult {
    init_tracing();
    let dir = tempdir()?;

    let err = with_timeout(watchpipe::run(once_args(dir.path(), &["false"])))
        .await
        .expect_err("a failing command must fail the run");

    match err.downcast_ref::<WatchpipeError>() {
        Some(WatchpipeError::RunFailed { failed: 1 }) => Ok(()),
        other => Err(format!("expected RunFailed {{ failed: 1 }}, got {other:?} ({err:#})").into()),
    }
}

#[tokio::test]
async fn once_succeeds_when_every_command_passes() -> TestResult {
    init_tracing();
    let dir = tempdir()?;

    with_timeout(watchpipe::run(once_args(
        dir.path(),
        &["true, sh -c 'echo built > out'", "sh -c 'test -f out'"],
    )))
    .await?;

    assert!(dir.path().join("out").exists());
    Ok(())
}

#[tokio::test]
async fn dry_run_executes_nothing() -> TestResult {
    let dir = tempdir()?;
    let args = CliArgs {
        dry_run: true,
        once: false,
        ..once_args(dir.path(), &["touch ran"])
    };

    with_timeout(watchpipe::run(args)).await?;

    assert!(!dir.path().join("ran").exists());
    Ok(())
}

#[tokio::test]
async fn invalid_settings_fail_before_anything_runs() -> TestResult {
    let dir = tempdir()?;
    let args = once_args(&dir.path().join("missing"), &["true"]);

    let err = with_timeout(watchpipe::run(args))
        .await
        .expect_err("missing watch root");
    // The working directory defaults to the watch root, which is missing.
    assert!(
        matches!(
            err.downcast_ref::<WatchpipeError>(),
            Some(WatchpipeError::ConfigError(_))
        ),
        "{err:#}"
    );
    Ok(())
}

#[tokio::test]
async fn each_batch_restarts_the_pipeline_until_the_runner_stops() -> TestResult {
    init_tracing();
    let executor = Arc::new(ScriptedExecutor::new().run("build", Duration::from_millis(10), 0));
    let pipeline = PipelineBuilder::new().group(&["build"]).build();
    let (runner, handle) = Runner::new(pipeline, Arc::clone(&executor), RunnerOptions::default());
    let task = runner.spawn();
    let mut notices = handle.subscribe();

    let mut on_batch = restart_on_batch(handle.clone());
    let batch = vec![
        WatcherEvent::new("/src/main.go", ChangeKind::Modified),
        WatcherEvent::new("/src/util.go", ChangeKind::Created),
    ];

    assert_eq!(on_batch(batch.clone()), ControlFlow::Continue(()));
    collect_until(&mut notices, Duration::from_secs(5), |n| {
        matches!(n, RunNotice::RunFinished { generation: 1, .. })
    })
    .await?;
    assert_eq!(executor.started(), vec![("build".to_string(), 1)]);

    handle.shutdown();
    with_timeout(task).await??;
    assert_eq!(on_batch(batch), ControlFlow::Break(()));
    Ok(())
}
