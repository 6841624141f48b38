// tests/supervisor_lifecycle.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use rewatch::errors::RewatchError;
use rewatch::fs::mock::MockFileSystem;
use rewatch::supervisor::{BuildReport, ProcessLifecycle, Supervisor, SupervisorEvent};
use rewatch::watch::Watcher;
use rewatch_test_utils::builders::WatchSettingsBuilder;
use rewatch_test_utils::fake_process::FakeProcessBackend;
use rewatch_test_utils::scripted_watch::{ScriptedWatchBackend, Step};
use rewatch_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

fn scripted_watcher(backend: ScriptedWatchBackend) -> Watcher {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/main.go");
    Watcher::new(WatchSettingsBuilder::new().dir("/proj").build())
        .with_filesystem(Arc::new(fs))
        .with_backend(Box::new(backend))
}

#[tokio::test]
async fn two_restarts_leave_exactly_one_child() {
    init_tracing();
    let fake = FakeProcessBackend::new();
    let mut lifecycle = ProcessLifecycle::new(fake.clone());

    lifecycle.start().await;
    lifecycle.restart(Some(Path::new("/proj/a.go"))).await;
    lifecycle.restart(Some(Path::new("/proj/b.go"))).await;

    assert!(lifecycle.is_running());
    assert_eq!(fake.live(), 1);
    assert_eq!(fake.max_live(), 1);
    assert_eq!(
        fake.log(),
        ["build", "spawn#1", "stop#1", "build", "spawn#2", "stop#2", "build", "spawn#3"]
    );
}

#[tokio::test]
async fn failed_build_starts_nothing_and_next_change_recovers() {
    init_tracing();
    let fake = FakeProcessBackend::new().with_build_results([
        BuildReport::succeeded(),
        BuildReport::failed(Some(2), "main.go:3: syntax error"),
        BuildReport::succeeded(),
    ]);
    let mut lifecycle = ProcessLifecycle::new(fake.clone());

    lifecycle.start().await;
    assert!(lifecycle.is_running());

    // Bad save: the old child is gone and no new one replaces it.
    lifecycle.restart(None).await;
    assert!(!lifecycle.is_running());
    assert_eq!(fake.live(), 0);

    lifecycle.restart(None).await;
    assert!(lifecycle.is_running());
    assert_eq!(fake.live(), 1);
    assert_eq!(fake.spawned(), 2);
    assert_eq!(fake.builds(), 3);
}

#[tokio::test]
async fn queued_triggers_coalesce_into_one_restart() -> TestResult {
    init_tracing();
    let fake = FakeProcessBackend::new();
    let (tx, rx) = mpsc::unbounded_channel();

    tx.send(SupervisorEvent::Start)?;
    for name in ["a.go", "b.go", "c.go"] {
        tx.send(SupervisorEvent::Trigger(PathBuf::from("/proj").join(name)))?;
    }
    drop(tx);

    with_timeout(ProcessLifecycle::new(fake.clone()).run(rx)).await?;

    assert_eq!(fake.builds(), 1);
    assert_eq!(fake.spawned(), 1);
    // Channel closed afterwards, so the child was stopped on the way out.
    assert_eq!(fake.live(), 0);
    Ok(())
}

#[tokio::test]
async fn triggers_during_a_slow_build_cause_one_more_restart() -> TestResult {
    init_tracing();
    let fake = FakeProcessBackend::new().with_build_delay(Duration::from_millis(200));
    let (tx, rx) = mpsc::unbounded_channel();

    let actor = tokio::spawn(ProcessLifecycle::new(fake.clone()).run(rx));

    tx.send(SupervisorEvent::Start)?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    // The first build is still running; these three pile up behind it.
    for _ in 0..3 {
        tx.send(SupervisorEvent::Trigger(PathBuf::from("/proj/main.go")))?;
    }
    tokio::time::sleep(Duration::from_millis(700)).await;
    tx.send(SupervisorEvent::Shutdown)?;

    with_timeout(actor).await??;

    assert_eq!(fake.builds(), 2);
    assert_eq!(fake.max_live(), 1);
    assert_eq!(fake.live(), 0);
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_the_child() -> TestResult {
    init_tracing();
    let fake = FakeProcessBackend::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let actor = tokio::spawn(ProcessLifecycle::new(fake.clone()).run(rx));

    tx.send(SupervisorEvent::Start)?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fake.live(), 1);

    tx.send(SupervisorEvent::Shutdown)?;
    with_timeout(actor).await??;

    assert_eq!(fake.live(), 0);
    assert_eq!(fake.stopped(), 1);
    Ok(())
}

#[tokio::test]
async fn supervisor_restarts_on_watcher_triggers_and_stops_on_shutdown() -> TestResult {
    init_tracing();
    let fake = FakeProcessBackend::new();
    let watch = ScriptedWatchBackend::new([
        Step::Pause(Duration::from_millis(100)),
        Step::Trigger(PathBuf::from("/proj/main.go")),
        Step::Pause(Duration::from_millis(100)),
        Step::Trigger(PathBuf::from("/proj/main.go")),
    ])
    .hold_open();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let supervisor = Supervisor::with_backend(fake.clone(), scripted_watcher(watch));
    let run = tokio::spawn(supervisor.start_with_shutdown(async move {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(fake.spawned(), 3);
    assert_eq!(fake.live(), 1);

    let _ = stop_tx.send(());
    with_timeout(run).await??;

    assert_eq!(fake.live(), 0);
    assert_eq!(fake.max_live(), 1);
    Ok(())
}

#[tokio::test]
async fn fatal_watcher_error_is_returned_and_the_child_stopped() -> TestResult {
    init_tracing();
    let fake = FakeProcessBackend::new();
    let watch = ScriptedWatchBackend::new([Step::Pause(Duration::from_millis(100))])
        .ending_with(Err(RewatchError::AllTargetsLost));

    let supervisor = Supervisor::with_backend(fake.clone(), scripted_watcher(watch));
    let result = with_timeout(supervisor.start_with_shutdown(std::future::pending())).await;

    assert!(matches!(result, Err(RewatchError::AllTargetsLost)));
    assert_eq!(fake.spawned(), 1);
    assert_eq!(fake.live(), 0);
    Ok(())
}
