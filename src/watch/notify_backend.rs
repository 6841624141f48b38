// src/watch/notify_backend.rs

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, trace};

use crate::errors::{Result, RewatchError};
use crate::watch::target::{TargetKind, WatchHandle, WatchTarget};
use crate::watch::watcher::{TriggerHook, WatchBackend};

/// Push-based backend on top of the `notify` crate's recommended watcher.
///
/// Each target is watched non-recursively; subdirectories are separate
/// targets already. Handles are handed out sequentially since `notify`
/// doesn't expose the OS descriptor.
pub struct NotifyBackend {
    debounce: Duration,
    targets: Vec<WatchTarget>,
    by_path: HashMap<PathBuf, usize>,
    // Keeps the OS watches alive; dropping it stops event delivery.
    watcher: Option<RecommendedWatcher>,
    events_rx: Option<mpsc::Receiver<notify::Result<Event>>>,
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend")
            .field("targets", &self.targets.len())
            .finish_non_exhaustive()
    }
}

impl NotifyBackend {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            targets: Vec::new(),
            by_path: HashMap::new(),
            watcher: None,
            events_rx: None,
        }
    }

    /// Find the target an event path belongs to: the path itself (a file
    /// target) or its parent directory (a directory target).
    fn target_index(&self, path: &Path) -> Option<usize> {
        if let Some(&idx) = self.by_path.get(path) {
            return Some(idx);
        }
        let parent = path.parent()?;
        self.by_path
            .get(parent)
            .copied()
            .filter(|&idx| self.targets[idx].kind() == TargetKind::Directory)
    }

    fn handle_event(&mut self, event: Event, on_trigger: &TriggerHook) {
        if !is_content_change(&event.kind) {
            trace!(kind = ?event.kind, "ignoring non-content event");
            return;
        }

        for path in &event.paths {
            let Some(idx) = self.target_index(path) else {
                debug!(path = ?path, "event outside any watch target");
                continue;
            };

            let window = self.debounce;
            let target = &mut self.targets[idx];
            if !target.debounce().is_ready(Instant::now(), window) {
                trace!(path = ?path, "event inside debounce window; dropped");
                continue;
            }

            let changed = if path.as_path() == target.path() {
                target.trigger_path(None)
            } else {
                target.trigger_path(path.file_name().map(Path::new))
            };
            info!(path = ?changed, "change detected");
            on_trigger(&changed);
            target.debounce_mut().mark(Instant::now());
        }
    }
}

impl WatchBackend for NotifyBackend {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn register(&mut self, targets: Vec<WatchTarget>) -> Result<()> {
        // Closure called synchronously by notify whenever an event arrives.
        let (event_tx, event_rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                // Receiver gone means the session is over.
                let _ = event_tx.send(res);
            },
            Config::default(),
        )?;

        for (idx, mut target) in targets.into_iter().enumerate() {
            watcher
                .watch(target.path(), RecursiveMode::NonRecursive)
                .map_err(|err| RewatchError::Registration {
                    path: target.path().to_path_buf(),
                    source: io::Error::other(err),
                })?;

            let handle = WatchHandle(idx as i32 + 1);
            target.set_handle(handle);
            debug!(path = ?target.path(), %handle, "notify watch added");
            self.by_path.insert(target.path().to_path_buf(), idx);
            self.targets.push(target);
        }

        self.watcher = Some(watcher);
        self.events_rx = Some(event_rx);
        Ok(())
    }

    fn run(&mut self, on_trigger: TriggerHook) -> Result<()> {
        let events_rx = self.events_rx.take().ok_or_else(|| {
            RewatchError::ConfigError("notify backend started before registration".to_string())
        })?;

        for res in events_rx.iter() {
            let event = res?;
            self.handle_event(event, &on_trigger);
        }

        // The sender lives inside the watcher we own, so this only happens
        // if notify tore itself down.
        Err(RewatchError::WatcherExited)
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) | EventKind::Create(_) => true,
        _ => false,
    }
}
