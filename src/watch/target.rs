// src/watch/target.rs

//! Watch targets and their per-target debounce state.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Default minimum time between two accepted events for the same target.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Modification time of every file a target covers, keyed by path.
pub type Snapshot = BTreeMap<PathBuf, SystemTime>;

/// Opaque identifier handed out by the notification facility (an inotify
/// watch descriptor, or a sequence number for backends without one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(pub i32);

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wd#{}", self.0)
    }
}

/// What a target stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// The immediate file contents of a directory (not its subdirectories).
    Directory,
    /// A single, individually configured file.
    File,
}

/// Suppresses duplicate notifications for one target.
///
/// Rejected events are dropped, never queued, and do not move the window.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebounceState {
    last_trigger: Option<Instant>,
}

impl DebounceState {
    /// Accept the event if more than `window` has elapsed since the last
    /// accepted one (or if nothing was accepted yet), recording `now`.
    pub fn accept(&mut self, now: Instant, window: Duration) -> bool {
        let ready = self.is_ready(now, window);
        if ready {
            self.mark(now);
        }
        ready
    }

    /// Whether the window has passed, without recording anything.
    pub fn is_ready(&self, now: Instant, window: Duration) -> bool {
        match self.last_trigger {
            None => true,
            Some(last) => now.saturating_duration_since(last) > window,
        }
    }

    pub fn mark(&mut self, at: Instant) {
        self.last_trigger = Some(at);
    }

    pub fn last_trigger(&self) -> Option<Instant> {
        self.last_trigger
    }
}

/// A directory or file registered for observation.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    path: PathBuf,
    kind: TargetKind,
    handle: Option<WatchHandle>,
    snapshot: Option<Snapshot>,
    debounce: DebounceState,
}

impl WatchTarget {
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), TargetKind::Directory)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path.into(), TargetKind::File)
    }

    fn new(path: PathBuf, kind: TargetKind) -> Self {
        Self {
            path,
            kind,
            handle: None,
            snapshot: None,
            debounce: DebounceState::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn handle(&self) -> Option<WatchHandle> {
        self.handle
    }

    pub fn set_handle(&mut self, handle: WatchHandle) {
        self.handle = Some(handle);
    }

    /// What the previous poll saw, if there was one.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Debounce gate for an incoming event, see [`DebounceState::accept`].
    pub fn accept_event(&mut self, now: Instant, window: Duration) -> bool {
        self.debounce.accept(now, window)
    }

    pub fn debounce(&self) -> &DebounceState {
        &self.debounce
    }

    pub fn debounce_mut(&mut self) -> &mut DebounceState {
        &mut self.debounce
    }

    /// Path handed to the trigger callback for an event on this target.
    ///
    /// Directory events that carry an entry name resolve to that entry;
    /// everything else reports the target itself.
    pub fn trigger_path(&self, name: Option<&Path>) -> PathBuf {
        match (self.kind, name) {
            (TargetKind::Directory, Some(name)) if !name.as_os_str().is_empty() => {
                self.path.join(name)
            }
            _ => self.path.clone(),
        }
    }
}
