mod common;
use crate::common::{collect_until, TestResult};

use std::sync::Arc;
use std::time::Duration;

use watchpipe::engine::{RunNotice, RunOutcome, Runner, RunnerOptions, TriggerReason};
use watchpipe::pipeline::CommandOutcome;
use watchpipe::types::FailurePolicy;
use watchpipe_test_utils::builders::PipelineBuilder;
use watchpipe_test_utils::fake_executor::{ExecEvent, ScriptedExecutor};
use watchpipe_test_utils::{init_tracing, with_timeout};

const LIMIT: Duration = Duration::from_secs(5);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn position(events: &[ExecEvent], pred: impl Fn(&ExecEvent) -> bool) -> usize {
    events
        .iter()
        .position(pred)
        .unwrap_or_else(|| panic!("event not found in {events:?}"))
}

fn started(name: &'static str, generation: u64) -> impl Fn(&ExecEvent) -> bool {
    move |e: &ExecEvent| matches!(e, ExecEvent::Started { command, generation: g } if command == name && *g == generation)
}

fn finished(name: &'static str, generation: u64) -> impl Fn(&ExecEvent) -> bool {
    move |e: &ExecEvent| matches!(e, ExecEvent::Finished { command, generation: g, .. } if command == name && *g == generation)
}

fn run_finished(notice: &RunNotice) -> bool {
    matches!(notice, RunNotice::RunFinished { .. })
}

#[tokio::test]
async fn groups_run_in_order_and_commands_overlap() -> TestResult {
    init_tracing();
    let executor = Arc::new(
        ScriptedExecutor::new()
            .run("a", ms(150), 0)
            .run("b", ms(100), 0)
            .run("c", ms(10), 0),
    );
    let pipeline = PipelineBuilder::new().group(&["a", "b"]).group(&["c"]).build();
    let (runner, handle) = Runner::new(pipeline, Arc::clone(&executor), RunnerOptions::default());
    let task = runner.spawn();

    let mut notices = handle.subscribe();
    handle.trigger(TriggerReason::Manual);
    let seen = collect_until(&mut notices, LIMIT, run_finished).await?;

    let events = executor.events();
    let c_start = position(&events, started("c", 1));
    assert!(position(&events, finished("a", 1)) < c_start);
    assert!(position(&events, finished("b", 1)) < c_start);

    // Both members of group 0 were running at the same time.
    let first_finish = events
        .iter()
        .position(|e| matches!(e, ExecEvent::Finished { .. }))
        .expect("something finished");
    assert!(position(&events, started("a", 1)) < first_finish);
    assert!(position(&events, started("b", 1)) < first_finish);

    match seen.last() {
        Some(RunNotice::RunFinished {
            generation: 1,
            outcome: RunOutcome::Completed(report),
        }) => {
            assert!(report.all_succeeded());
            assert_eq!(report.groups.len(), 2);
            let labels: Vec<&str> = report.outcomes().map(|(l, _)| l.as_str()).collect();
            assert_eq!(labels, vec!["a", "b", "c"]);
        }
        other => panic!("unexpected final notice {other:?}"),
    }

    handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test]
async fn retrigger_terminates_previous_run_before_starting_again() -> TestResult {
    init_tracing();
    let executor = Arc::new(
        ScriptedExecutor::new()
            .run("long", ms(400), 0)
            .run("after", ms(10), 0),
    );
    let pipeline = PipelineBuilder::new().group(&["long"]).group(&["after"]).build();
    let (runner, handle) = Runner::new(pipeline, Arc::clone(&executor), RunnerOptions::default());
    let task = runner.spawn();

    let mut notices = handle.subscribe();
    handle.trigger(TriggerReason::Startup);
    collect_until(&mut notices, LIMIT, |n| {
        matches!(n, RunNotice::GroupStarted { generation: 1, group: 0 })
    })
    .await?;
    tokio::time::sleep(ms(50)).await;
    handle.trigger(TriggerReason::FileChange { changes: 1 });

    let seen = collect_until(&mut notices, LIMIT, run_finished).await?;

    // The first run was discarded, never reported as finished.
    assert!(seen.contains(&RunNotice::RunPreempted { generation: 1 }));
    assert!(matches!(
        seen.last(),
        Some(RunNotice::RunFinished { generation: 2, outcome: RunOutcome::Completed(_) })
    ));
    let preempted_at = seen
        .iter()
        .position(|n| n == &RunNotice::RunPreempted { generation: 1 })
        .expect("preempted notice");
    let second_start = seen
        .iter()
        .position(|n| n == &RunNotice::RunStarted { generation: 2 })
        .expect("second run started");
    assert!(preempted_at < second_start);

    let events = executor.events();
    assert!(events.contains(&ExecEvent::Finished {
        command: "long".into(),
        generation: 1,
        outcome: CommandOutcome::Terminated,
    }));
    assert!(position(&events, finished("long", 1)) < position(&events, started("long", 2)));
    // Generation 1 never reached its second group.
    assert!(!events.iter().any(started("after", 1)));
    assert!(events.iter().any(started("after", 2)));

    handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test]
async fn failed_group_does_not_stop_the_pipeline_by_default() -> TestResult {
    init_tracing();
    let executor = Arc::new(
        ScriptedExecutor::new()
            .run("build", ms(10), 2)
            .fail_launch("missing")
            .run("serve", ms(10), 0),
    );
    let pipeline = PipelineBuilder::new()
        .group(&["build", "missing"])
        .group(&["serve"])
        .build();
    let (runner, handle) = Runner::new(pipeline, Arc::clone(&executor), RunnerOptions::default());
    let task = runner.spawn();

    let mut notices = handle.subscribe();
    handle.trigger(TriggerReason::Manual);
    let seen = collect_until(&mut notices, LIMIT, run_finished).await?;

    match seen.last() {
        Some(RunNotice::RunFinished {
            outcome: RunOutcome::Completed(report),
            ..
        }) => {
            assert_eq!(report.failures(), 2);
            assert_eq!(report.groups[0].outcomes[0].1, CommandOutcome::Exited(2));
            assert!(matches!(
                report.groups[0].outcomes[1].1,
                CommandOutcome::LaunchFailed(_)
            ));
            assert_eq!(report.groups[1].outcomes[0].1, CommandOutcome::Exited(0));
        }
        other => panic!("unexpected final notice {other:?}"),
    }
    assert!(executor.events().iter().any(started("serve", 1)));

    handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test]
async fn strict_policy_aborts_after_failed_group() -> TestResult {
    init_tracing();
    let executor = Arc::new(
        ScriptedExecutor::new()
            .run("build", ms(10), 1)
            .run("serve", ms(10), 0),
    );
    let pipeline = PipelineBuilder::new().group(&["build"]).group(&["serve"]).build();
    let options = RunnerOptions {
        policy: FailurePolicy::Strict,
    };
    let (runner, handle) = Runner::new(pipeline, Arc::clone(&executor), options);
    let task = runner.spawn();

    let mut notices = handle.subscribe();
    handle.trigger(TriggerReason::Manual);
    let seen = collect_until(&mut notices, LIMIT, run_finished).await?;

    match seen.last() {
        Some(RunNotice::RunFinished {
            outcome: RunOutcome::Aborted { report, group },
            ..
        }) => {
            assert_eq!(*group, 0);
            assert_eq!(report.failures(), 1);
        }
        other => panic!("unexpected final notice {other:?}"),
    }
    assert!(!executor.events().iter().any(started("serve", 1)));

    handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test]
async fn burst_of_triggers_only_completes_the_last_generation() -> TestResult {
    init_tracing();
    let executor = Arc::new(ScriptedExecutor::new().run("step", ms(100), 0));
    let pipeline = PipelineBuilder::new().group(&["step"]).build();
    let (runner, handle) = Runner::new(pipeline, Arc::clone(&executor), RunnerOptions::default());
    let task = runner.spawn();

    let mut notices = handle.subscribe();
    for _ in 0..5 {
        handle.trigger(TriggerReason::FileChange { changes: 1 });
    }
    let seen = collect_until(&mut notices, LIMIT, run_finished).await?;

    let finished_runs: Vec<_> = seen
        .iter()
        .filter_map(|n| match n {
            RunNotice::RunFinished { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect();
    assert_eq!(finished_runs, vec![5]);
    assert_eq!(handle.generation(), 5);

    // Never more than one "step" alive at a time.
    let mut running = 0i32;
    for event in executor.events() {
        match event {
            ExecEvent::Started { .. } => running += 1,
            ExecEvent::Finished { .. } => running -= 1,
        }
        assert!(running <= 1);
    }

    handle.shutdown();
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test]
async fn shutdown_preempts_active_run_and_stops_runner() -> TestResult {
    init_tracing();
    let executor = Arc::new(ScriptedExecutor::new().run("server", Duration::from_secs(30), 0));
    let pipeline = PipelineBuilder::new().group(&["server"]).build();
    let (runner, handle) = Runner::new(pipeline, Arc::clone(&executor), RunnerOptions::default());
    let task = runner.spawn();

    let mut notices = handle.subscribe();
    handle.trigger(TriggerReason::Startup);
    collect_until(&mut notices, LIMIT, |n| {
        matches!(n, RunNotice::GroupStarted { generation: 1, .. })
    })
    .await?;
    tokio::time::sleep(ms(20)).await;

    handle.shutdown();
    with_timeout(task).await??;

    assert!(executor.events().contains(&ExecEvent::Finished {
        command: "server".into(),
        generation: 1,
        outcome: CommandOutcome::Terminated,
    }));
    assert!(!handle.trigger(TriggerReason::Manual));
    Ok(())
}

#[tokio::test]
async fn dropping_every_handle_stops_the_runner() -> TestResult {
    let executor = Arc::new(ScriptedExecutor::new());
    let pipeline = PipelineBuilder::new().group(&["noop"]).build();
    let (runner, handle) = Runner::new(pipeline, executor, RunnerOptions::default());
    let task = runner.spawn();

    drop(handle);
    with_timeout(task).await??;
    Ok(())
}
