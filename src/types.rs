// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Which change-detection strategy the watcher uses.
///
/// - `Auto`: raw inotify on Linux, the `notify` crate's recommended watcher
///   everywhere else.
/// - `Inotify`: raw inotify; only valid on Linux.
/// - `Notify`: the `notify` crate's recommended watcher (FSEvents, kqueue,
///   ReadDirectoryChangesW, or inotify depending on the platform).
/// - `Poll`: poll modification timestamps, one thread per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    #[default]
    Auto,
    Inotify,
    Notify,
    Poll,
}

impl WatchMode {
    /// Resolve `Auto` to the concrete strategy for the current platform.
    pub fn resolve(self) -> WatchMode {
        match self {
            WatchMode::Auto if cfg!(target_os = "linux") => WatchMode::Inotify,
            WatchMode::Auto => WatchMode::Notify,
            other => other,
        }
    }

    /// Whether this mode can run on the current platform.
    pub fn is_supported(self) -> bool {
        !matches!(self, WatchMode::Inotify) || cfg!(target_os = "linux")
    }
}

impl FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(WatchMode::Auto),
            "inotify" => Ok(WatchMode::Inotify),
            "notify" => Ok(WatchMode::Notify),
            "poll" | "polling" => Ok(WatchMode::Poll),
            other => Err(format!(
                "invalid watch mode: {other} (expected \"auto\", \"inotify\", \"notify\" or \"poll\")"
            )),
        }
    }
}

impl fmt::Display for WatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchMode::Auto => "auto",
            WatchMode::Inotify => "inotify",
            WatchMode::Notify => "notify",
            WatchMode::Poll => "poll",
        };
        f.write_str(s)
    }
}
