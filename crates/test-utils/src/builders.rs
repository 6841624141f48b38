#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use rewatch::config::{ConfigFile, RawConfigFile};
use rewatch::supervisor::CommandSpec;
use rewatch::types::WatchMode;
use rewatch::watch::WatchSettings;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_dir(mut self, dir: &str) -> Self {
        self.config.watch.directories.push(PathBuf::from(dir));
        self
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.config.watch.files.push(PathBuf::from(file));
        self
    }

    pub fn with_exclude(mut self, dir: &str) -> Self {
        self.config.watch.exclude.push(PathBuf::from(dir));
        self
    }

    pub fn with_mode(mut self, mode: WatchMode) -> Self {
        self.config.watch.mode = mode;
        self
    }

    pub fn with_entry(mut self, entry: &str) -> Self {
        self.config.supervisor.entry_point = PathBuf::from(entry);
        self
    }

    pub fn with_build(mut self, program: &str, args: &[&str]) -> Self {
        self.config.supervisor.build = CommandSpec::new(program, args.iter().copied());
        self
    }

    pub fn with_run(mut self, program: &str, args: &[&str]) -> Self {
        self.config.supervisor.run = CommandSpec::new(program, args.iter().copied());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `WatchSettings`.
pub struct WatchSettingsBuilder {
    settings: WatchSettings,
}

impl WatchSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: WatchSettings::default(),
        }
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.directories.push(dir.into());
        self
    }

    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.settings.files.push(file.into());
        self
    }

    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.excluded_directories.push(dir.into());
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.settings.debounce = Duration::from_millis(ms);
        self
    }

    pub fn mode(mut self, mode: WatchMode) -> Self {
        self.settings.mode = mode;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.settings.poll_interval = Duration::from_millis(ms);
        self
    }

    pub fn build(self) -> WatchSettings {
        self.settings
    }
}

impl Default for WatchSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
