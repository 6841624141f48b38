// tests/poll_watch.rs

mod common;
use crate::common::{init_tracing, start_watcher, wait_until};

use std::error::Error;
use std::fs::{self, File};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use rewatch::errors::RewatchError;
use rewatch::fs::mock::MockFileSystem;
use rewatch::types::WatchMode;
use rewatch::watch::Watcher;
use rewatch_test_utils::builders::WatchSettingsBuilder;
use rewatch_test_utils::TriggerRecorder;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn startup_does_not_fire_and_a_later_change_does() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let dir = tmp.path().canonicalize()?;
    let file = dir.join("main.go");
    fs::write(&file, "package main")?;

    let recorder = TriggerRecorder::new();
    let mut watcher = Watcher::new(
        WatchSettingsBuilder::new()
            .file(&file)
            .mode(WatchMode::Poll)
            .poll_interval_ms(20)
            .debounce_ms(100)
            .build(),
    );
    watcher.on_trigger(recorder.hook());
    let _handle = start_watcher(watcher);

    thread::sleep(Duration::from_millis(150));
    assert_eq!(recorder.count(), 0, "initial observation must not fire");

    // Push the mtime well away from the recorded one, whatever the
    // filesystem's timestamp granularity.
    File::options()
        .write(true)
        .open(&file)?
        .set_modified(SystemTime::now() + Duration::from_secs(10))?;

    assert!(wait_until(Duration::from_secs(2), || recorder.count() == 1));
    assert_eq!(recorder.paths(), [file]);
    Ok(())
}

#[test]
fn losing_every_target_ends_the_session() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/a.go");
    fs.add_file("/etc/rewatch/cfg.toml");

    let watcher = Watcher::new(
        WatchSettingsBuilder::new()
            .dir("/proj")
            .file("/etc/rewatch/cfg.toml")
            .mode(WatchMode::Poll)
            .poll_interval_ms(10)
            .build(),
    )
    .with_filesystem(Arc::new(fs.clone()));
    let handle = start_watcher(watcher);

    // One target gone: the other keeps the session alive.
    fs.remove("/etc/rewatch/cfg.toml");
    thread::sleep(Duration::from_millis(100));
    assert!(!handle.is_finished());

    fs.remove("/proj");
    assert!(wait_until(Duration::from_secs(2), || handle.is_finished()));

    let result = handle.join().expect("watch thread panicked");
    assert!(matches!(result, Err(RewatchError::AllTargetsLost)));
    Ok(())
}

#[test]
fn mock_directory_change_reports_the_newest_file() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/proj/src/a.go");
    fs.add_file("/proj/src/b.go");

    let recorder = TriggerRecorder::new();
    let mut watcher = Watcher::new(
        WatchSettingsBuilder::new()
            .dir("/proj")
            .mode(WatchMode::Poll)
            .poll_interval_ms(10)
            .debounce_ms(50)
            .build(),
    )
    .with_filesystem(Arc::new(fs.clone()));
    watcher.on_trigger(recorder.hook());
    let _handle = start_watcher(watcher);

    thread::sleep(Duration::from_millis(60));
    fs.touch("/proj/src/a.go", Duration::from_secs(5));

    assert!(wait_until(Duration::from_secs(2), || recorder.count() == 1));
    assert_eq!(recorder.paths(), [std::path::PathBuf::from("/proj/src/a.go")]);
    Ok(())
}
