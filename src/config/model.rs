// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::{CommandSpec, SupervisorSettings};
use crate::types::WatchMode;
use crate::watch::WatchSettings;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// directories = ["src", "templates"]
/// exclude = ["src/generated"]
/// files = ["go.mod"]
/// debounce_ms = 1000
/// mode = "auto"
///
/// [supervisor]
/// entry_point = "cmd/server.go"
/// build = ["go", "build", "{entry}"]
/// run = ["./{artifact}"]
/// ```
///
/// All sections are optional and have reasonable defaults. This is the
/// unvalidated form; see [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directories walked recursively.
    #[serde(default)]
    pub directories: Vec<PathBuf>,

    /// Directories skipped together with everything below them. Exact
    /// paths, not globs.
    #[serde(default)]
    pub exclude: Vec<PathBuf>,

    /// Individual files, watched unconditionally.
    #[serde(default)]
    pub files: Vec<PathBuf>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default)]
    pub mode: WatchMode,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            exclude: Vec::new(),
            files: Vec::new(),
            debounce_ms: default_debounce_ms(),
            mode: WatchMode::default(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    /// When false, `rewatch` exits right away without building or watching.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_entry_point")]
    pub entry_point: PathBuf,

    #[serde(default = "CommandSpec::default_build")]
    pub build: CommandSpec,

    #[serde(default = "CommandSpec::default_run")]
    pub run: CommandSpec,

    /// SIGTERM grace period before SIGKILL. Absent or 0 kills immediately.
    #[serde(default)]
    pub stop_timeout_ms: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

fn default_entry_point() -> PathBuf {
    PathBuf::from("main.go")
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            entry_point: default_entry_point(),
            build: CommandSpec::default_build(),
            run: CommandSpec::default_run(),
            stop_timeout_ms: None,
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub supervisor: SupervisorSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(watch: WatchSection, supervisor: SupervisorSection) -> Self {
        Self { watch, supervisor }
    }

    /// Watcher settings, with relative paths resolved against `base`.
    pub fn watch_settings(&self, base: &Path) -> WatchSettings {
        let resolve = |paths: &[PathBuf]| -> Vec<PathBuf> {
            paths.iter().map(|p| base.join(p)).collect()
        };

        WatchSettings {
            directories: resolve(&self.watch.directories),
            files: resolve(&self.watch.files),
            excluded_directories: resolve(&self.watch.exclude),
            debounce: Duration::from_millis(self.watch.debounce_ms),
            mode: self.watch.mode,
            poll_interval: Duration::from_millis(self.watch.poll_interval_ms),
        }
    }

    /// Supervisor settings. A relative entry point is resolved against
    /// `base`, the same directory the watch paths are resolved against.
    pub fn supervisor_settings(&self, base: &Path) -> SupervisorSettings {
        SupervisorSettings {
            entry: base.join(&self.supervisor.entry_point),
            build: self.supervisor.build.clone(),
            run: self.supervisor.run.clone(),
            stop_timeout: self
                .supervisor
                .stop_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    }
}
