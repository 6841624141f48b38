// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{Result, RewatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::WatchMode;
use crate::watch::enumerate::collect_targets;
use crate::watch::notify_backend::NotifyBackend;
use crate::watch::poll::PollBackend;
use crate::watch::settings::WatchSettings;
use crate::watch::target::WatchTarget;

/// Invoked exactly once, after every target is registered and before the
/// event loop starts blocking.
pub type StartHook = Box<dyn FnOnce() + Send>;

/// Invoked once per accepted (non-debounced) change, with the changed path.
///
/// Push backends call it from the single event-loop thread; the polling
/// backend calls it from whichever per-target thread saw the change.
pub type TriggerHook = Arc<dyn Fn(&Path) + Send + Sync>;

/// A change-detection strategy.
///
/// `register` is called once with the full target set; `run` then blocks
/// for the rest of the session and only returns on a fatal error.
pub trait WatchBackend: Send {
    fn name(&self) -> &'static str;

    fn register(&mut self, targets: Vec<WatchTarget>) -> Result<()>;

    fn run(&mut self, on_trigger: TriggerHook) -> Result<()>;
}

/// Watches a fixed set of directories and files and reports changes.
///
/// Configuration is frozen at start: [`Watcher::start`] takes `self`, so the
/// setters can't be reached once the session is running.
pub struct Watcher {
    settings: WatchSettings,
    fs: Arc<dyn FileSystem>,
    backend: Option<Box<dyn WatchBackend>>,
    on_start: Option<StartHook>,
    on_trigger: Option<TriggerHook>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("settings", &self.settings)
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .finish_non_exhaustive()
    }
}

impl Default for Watcher {
    fn default() -> Self {
        Self::new(WatchSettings::default())
    }
}

impl Watcher {
    pub fn new(settings: WatchSettings) -> Self {
        Self {
            settings,
            fs: Arc::new(RealFileSystem),
            backend: None,
            on_start: None,
            on_trigger: None,
        }
    }

    /// Use a different filesystem for enumeration (and polling).
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Bypass strategy selection and use `backend` directly.
    pub fn with_backend(mut self, backend: Box<dyn WatchBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn set_directories(&mut self, dirs: Vec<PathBuf>) {
        self.settings.directories = dirs;
    }

    pub fn set_files(&mut self, files: Vec<PathBuf>) {
        self.settings.files = files;
    }

    pub fn set_excluded_directories(&mut self, dirs: Vec<PathBuf>) {
        self.settings.excluded_directories = dirs;
    }

    pub fn set_debounce(&mut self, window: Duration) {
        self.settings.debounce = window;
    }

    pub fn set_mode(&mut self, mode: WatchMode) {
        self.settings.mode = mode;
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.settings.poll_interval = interval;
    }

    pub fn on_start<F>(&mut self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_start = Some(Box::new(hook));
    }

    pub fn on_trigger<F>(&mut self, hook: F)
    where
        F: Fn(&Path) + Send + Sync + 'static,
    {
        self.on_trigger = Some(Arc::new(hook));
    }

    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    /// Enumerate the targets the current settings would register.
    pub fn targets(&self) -> Result<Vec<WatchTarget>> {
        collect_targets(self.fs.as_ref(), &self.settings)
    }

    /// Enumerate, register, fire the start hook, then block in the event
    /// loop.
    ///
    /// Only returns on an unrecoverable failure: a configured path is
    /// missing, nothing to watch, the notification facility could not be
    /// set up or a target could not be registered, or the event stream
    /// broke. Run it on its own thread if the caller must keep going.
    pub fn start(mut self) -> Result<()> {
        let targets = self.targets()?;
        if targets.is_empty() {
            return Err(RewatchError::NoWatchTargets);
        }

        let mut backend = match self.backend.take() {
            Some(backend) => backend,
            None => backend_for(&self.settings, Arc::clone(&self.fs))?,
        };

        info!(
            backend = backend.name(),
            targets = targets.len(),
            debounce_ms = self.settings.debounce.as_millis() as u64,
            "registering watch targets"
        );
        for target in &targets {
            debug!(path = ?target.path(), kind = ?target.kind(), "watch target");
        }

        backend.register(targets)?;

        if let Some(hook) = self.on_start.take() {
            hook();
        }

        let on_trigger: TriggerHook = match self.on_trigger.take() {
            Some(hook) => hook,
            None => Arc::new(|path: &Path| {
                debug!(path = ?path, "change detected (no trigger hook set)");
            }),
        };

        backend.run(on_trigger)
    }
}

/// Pick the backend for `settings.mode` on the current platform.
pub fn backend_for(
    settings: &WatchSettings,
    fs: Arc<dyn FileSystem>,
) -> Result<Box<dyn WatchBackend>> {
    match settings.mode.resolve() {
        WatchMode::Inotify => inotify_backend(settings.debounce),
        WatchMode::Poll => Ok(Box::new(PollBackend::new(
            fs,
            settings.debounce,
            settings.poll_interval,
        ))),
        WatchMode::Notify | WatchMode::Auto => Ok(Box::new(NotifyBackend::new(settings.debounce))),
    }
}

#[cfg(target_os = "linux")]
fn inotify_backend(debounce: Duration) -> Result<Box<dyn WatchBackend>> {
    Ok(Box::new(crate::watch::inotify::InotifyBackend::new(debounce)?))
}

#[cfg(not(target_os = "linux"))]
fn inotify_backend(_debounce: Duration) -> Result<Box<dyn WatchBackend>> {
    Err(RewatchError::ConfigError(
        "watch mode \"inotify\" is only available on Linux".to_string(),
    ))
}
