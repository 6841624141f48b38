// src/watch/settings.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::types::WatchMode;
use crate::watch::target::DEFAULT_DEBOUNCE;

/// Default sleep between two polls of the same target in polling mode.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Everything the watcher needs to know before `start`.
///
/// Exclusions are exact paths compared against the directories met during
/// the walk; they are not globs.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub directories: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
    pub excluded_directories: Vec<PathBuf>,
    pub debounce: Duration,
    pub mode: WatchMode,
    pub poll_interval: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            files: Vec::new(),
            excluded_directories: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
            mode: WatchMode::Auto,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
