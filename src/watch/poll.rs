// src/watch/poll.rs

//! Polling fallback: compare modification timestamps on a fixed interval.
//!
//! One thread per target. The threads share nothing but the filesystem
//! handle and the trigger hook, each owns its target's timestamps outright,
//! so no locking is involved.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::errors::{Result, RewatchError};
use crate::fs::{is_not_found, FileSystem};
use crate::watch::target::{Snapshot, TargetKind, WatchTarget};
use crate::watch::watcher::{TriggerHook, WatchBackend};

#[derive(Debug)]
pub struct PollBackend {
    fs: Arc<dyn FileSystem>,
    debounce: Duration,
    interval: Duration,
    targets: Vec<WatchTarget>,
}

impl PollBackend {
    pub fn new(fs: Arc<dyn FileSystem>, debounce: Duration, interval: Duration) -> Self {
        Self {
            fs,
            debounce,
            interval,
            targets: Vec::new(),
        }
    }
}

impl WatchBackend for PollBackend {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn register(&mut self, targets: Vec<WatchTarget>) -> Result<()> {
        self.targets = targets;
        Ok(())
    }

    fn run(&mut self, on_trigger: TriggerHook) -> Result<()> {
        let mut workers = Vec::with_capacity(self.targets.len());

        for (idx, target) in self.targets.drain(..).enumerate() {
            let fs = Arc::clone(&self.fs);
            let on_trigger = Arc::clone(&on_trigger);
            let (debounce, interval) = (self.debounce, self.interval);

            let worker = thread::Builder::new()
                .name(format!("rewatch-poll-{idx}"))
                .spawn(move || poll_loop(fs.as_ref(), target, debounce, interval, &on_trigger))?;
            workers.push(worker);
        }

        info!(threads = workers.len(), "polling watch targets");

        for worker in workers {
            if worker.join().is_err() {
                warn!("poll thread panicked");
            }
        }

        Err(RewatchError::AllTargetsLost)
    }
}

fn poll_loop(
    fs: &dyn FileSystem,
    mut target: WatchTarget,
    debounce: Duration,
    interval: Duration,
    on_trigger: &TriggerHook,
) {
    loop {
        match poll_once(fs, &mut target, debounce, Instant::now()) {
            Ok(Some(changed)) => {
                info!(path = ?changed, "change detected");
                on_trigger(&changed);
            }
            Ok(None) => {}
            Err(err) if is_not_found(&err) => {
                info!(path = ?target.path(), "watch target disappeared; stopping its poll loop");
                return;
            }
            Err(err) => {
                warn!(path = ?target.path(), error = %err, "failed to stat watch target; stopping its poll loop");
                return;
            }
        }
        thread::sleep(interval);
    }
}

/// One poll of one target.
///
/// The first observation only records what it saw. After that, a file whose
/// timestamp moved, or one that appeared since the last poll, yields a path
/// to report (the newest such file). Removals are recorded silently. A
/// change inside the debounce window is recorded and dropped.
pub fn poll_once(
    fs: &dyn FileSystem,
    target: &mut WatchTarget,
    debounce: Duration,
    now: Instant,
) -> anyhow::Result<Option<PathBuf>> {
    let current = observe(fs, target)?;

    let Some(previous) = target.snapshot() else {
        trace!(path = ?target.path(), files = current.len(), "recorded initial snapshot");
        target.set_snapshot(current);
        return Ok(None);
    };

    let changed = current
        .iter()
        .filter(|(path, stamp)| previous.get(*path) != Some(*stamp))
        .max_by_key(|(_, stamp)| **stamp)
        .map(|(path, _)| path.clone());
    target.set_snapshot(current);

    let Some(changed) = changed else {
        return Ok(None);
    };
    if !target.accept_event(now, debounce) {
        debug!(path = ?changed, "change inside debounce window; dropped");
        return Ok(None);
    }
    Ok(Some(changed))
}

/// Current timestamps for a target: its own for a file, those of its
/// immediate files for a directory.
fn observe(fs: &dyn FileSystem, target: &WatchTarget) -> anyhow::Result<Snapshot> {
    let path = target.path();
    let mut snapshot = Snapshot::new();
    match target.kind() {
        TargetKind::File => {
            snapshot.insert(path.to_path_buf(), fs.modified(path)?);
        }
        TargetKind::Directory => {
            for entry in fs.read_dir(path)? {
                if fs.is_dir(&entry) {
                    continue;
                }
                // Files can vanish between listing and stat.
                if let Ok(stamp) = fs.modified(&entry) {
                    snapshot.insert(entry, stamp);
                }
            }
        }
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::time::SystemTime;

    const WINDOW: Duration = Duration::from_millis(1000);

    #[test]
    fn first_poll_records_without_firing() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/main.go");
        let mut target = WatchTarget::file("/p/main.go");

        assert_eq!(poll_once(&fs, &mut target, WINDOW, Instant::now()).unwrap(), None);
        assert_eq!(target.snapshot().map(|s| s.len()), Some(1));
    }

    #[test]
    fn changed_timestamp_fires_once() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/main.go");
        let mut target = WatchTarget::file("/p/main.go");
        let t0 = Instant::now();

        poll_once(&fs, &mut target, WINDOW, t0).unwrap();
        fs.touch("/p/main.go", Duration::from_secs(1));

        let fired = poll_once(&fs, &mut target, WINDOW, t0).unwrap();
        assert_eq!(fired, Some(PathBuf::from("/p/main.go")));
        assert_eq!(poll_once(&fs, &mut target, WINDOW, t0).unwrap(), None);
    }

    #[test]
    fn changes_inside_window_are_dropped() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.txt");
        let mut target = WatchTarget::file("/p/a.txt");
        let t0 = Instant::now();

        poll_once(&fs, &mut target, WINDOW, t0).unwrap();
        fs.touch("/p/a.txt", Duration::from_secs(1));
        assert!(poll_once(&fs, &mut target, WINDOW, t0).unwrap().is_some());

        fs.touch("/p/a.txt", Duration::from_secs(1));
        let again = t0 + Duration::from_millis(300);
        assert_eq!(poll_once(&fs, &mut target, WINDOW, again).unwrap(), None);

        // The dropped change was recorded, so nothing fires later either.
        let later = t0 + Duration::from_secs(5);
        assert_eq!(poll_once(&fs, &mut target, WINDOW, later).unwrap(), None);
    }

    #[test]
    fn directory_reports_its_newest_file() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/a.rs");
        fs.add_file("/p/src/b.rs");
        fs.add_dir("/p/src/nested");
        let mut target = WatchTarget::directory("/p/src");
        let t0 = Instant::now();

        poll_once(&fs, &mut target, WINDOW, t0).unwrap();
        fs.touch("/p/src/b.rs", Duration::from_secs(2));

        let fired = poll_once(&fs, &mut target, WINDOW, t0).unwrap();
        assert_eq!(fired, Some(PathBuf::from("/p/src/b.rs")));
    }

    #[test]
    fn deleting_the_newest_file_does_not_fire() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/a.rs");
        fs.add_file("/p/src/b.rs");
        fs.touch("/p/src/b.rs", Duration::from_secs(10));
        let mut target = WatchTarget::directory("/p/src");
        let t0 = Instant::now();

        poll_once(&fs, &mut target, WINDOW, t0).unwrap();
        fs.remove("/p/src/b.rs");

        assert_eq!(poll_once(&fs, &mut target, WINDOW, t0).unwrap(), None);
        // The untouched survivor still reports its own later edit.
        fs.touch("/p/src/a.rs", Duration::from_secs(1));
        let later = t0 + Duration::from_secs(5);
        assert_eq!(
            poll_once(&fs, &mut target, WINDOW, later).unwrap(),
            Some(PathBuf::from("/p/src/a.rs"))
        );
    }

    #[test]
    fn new_file_with_an_older_timestamp_fires() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/a.rs");
        fs.touch("/p/src/a.rs", Duration::from_secs(60));
        let mut target = WatchTarget::directory("/p/src");
        let t0 = Instant::now();

        poll_once(&fs, &mut target, WINDOW, t0).unwrap();
        // Copied in with its original, older mtime preserved.
        fs.add_file_at("/p/src/old.rs", SystemTime::UNIX_EPOCH);

        assert_eq!(
            poll_once(&fs, &mut target, WINDOW, t0).unwrap(),
            Some(PathBuf::from("/p/src/old.rs"))
        );
    }

    #[test]
    fn vanished_target_is_reported_as_not_found() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/gone.txt");
        let mut target = WatchTarget::file("/p/gone.txt");

        poll_once(&fs, &mut target, WINDOW, Instant::now()).unwrap();
        fs.remove("/p/gone.txt");

        let err = poll_once(&fs, &mut target, WINDOW, Instant::now()).unwrap_err();
        assert!(is_not_found(&err));
    }
}
