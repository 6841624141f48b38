// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::config::RawConfigFile;
use crate::types::WatchMode;

/// Command-line arguments for `rewatch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "rewatch",
    version,
    about = "Rebuild and restart a program whenever its source files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Rewatch.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Entry point handed to the build command as `{entry}`.
    #[arg(long, value_name = "PATH")]
    pub entry: Option<PathBuf>,

    /// Directory to watch recursively (repeatable). Replaces `[watch].directories`.
    #[arg(long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Individual file to watch (repeatable). Replaces `[watch].files`.
    #[arg(long = "file", value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Directory to skip together with its subtree (repeatable). Replaces
    /// `[watch].exclude`.
    #[arg(long = "exclude", value_name = "DIR")]
    pub excludes: Vec<PathBuf>,

    /// Minimum time between two accepted changes of the same target.
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Change-detection strategy: auto, inotify, notify or poll.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<WatchMode>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the resolved watch targets and commands, then exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Overlay the flags that were given onto `raw`.
    ///
    /// Paths from the command line are relative to the working directory,
    /// so they are made absolute here; config-file paths are resolved
    /// against the config's directory later.
    pub fn apply_overrides(&self, raw: &mut RawConfigFile) {
        if !self.dirs.is_empty() {
            raw.watch.directories = absolutize(&self.dirs);
        }
        if !self.files.is_empty() {
            raw.watch.files = absolutize(&self.files);
        }
        if !self.excludes.is_empty() {
            raw.watch.exclude = absolutize(&self.excludes);
        }
        if let Some(ms) = self.debounce_ms {
            raw.watch.debounce_ms = ms;
        }
        if let Some(mode) = self.mode {
            raw.watch.mode = mode;
        }
        if let Some(entry) = &self.entry {
            raw.supervisor.entry_point = std::path::absolute(entry).unwrap_or_else(|_| entry.clone());
        }
    }
}

fn absolutize(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .map(|p| std::path::absolute(p).unwrap_or_else(|_| p.clone()))
        .collect()
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Directory that relative config paths are resolved against.
///
/// - `configs/Rewatch.toml` → `configs`
/// - `Rewatch.toml` (no parent) → the current working directory
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_and_repeat() {
        let args = CliArgs::try_parse_from([
            "rewatch", "--dir", "/a", "--dir", "/b", "--mode", "poll", "--debounce-ms", "250",
            "--entry", "cmd/api.go",
        ])
        .unwrap();

        assert_eq!(args.dirs, [PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(args.mode, Some(WatchMode::Poll));
        assert_eq!(args.debounce_ms, Some(250));
        assert_eq!(args.entry, Some(PathBuf::from("cmd/api.go")));
    }

    #[test]
    fn only_given_flags_override_the_file() {
        let mut raw = RawConfigFile::default();
        raw.watch.directories = vec![PathBuf::from("src")];
        raw.watch.debounce_ms = 700;

        let args = CliArgs {
            files: vec![PathBuf::from("/etc/app.toml")],
            ..CliArgs::default()
        };
        args.apply_overrides(&mut raw);

        assert_eq!(raw.watch.directories, [PathBuf::from("src")]);
        assert_eq!(raw.watch.files, [PathBuf::from("/etc/app.toml")]);
        assert_eq!(raw.watch.debounce_ms, 700);
        assert_eq!(raw.supervisor.entry_point, PathBuf::from("main.go"));
    }

    #[test]
    fn entry_flag_is_relative_to_the_working_directory() {
        let mut raw = RawConfigFile::default();
        let args = CliArgs {
            entry: Some(PathBuf::from("cmd/api.go")),
            ..CliArgs::default()
        };
        args.apply_overrides(&mut raw);

        let cwd = std::env::current_dir().unwrap();
        assert_eq!(raw.supervisor.entry_point, cwd.join("cmd/api.go"));
    }

    #[test]
    fn bare_config_name_resolves_to_cwd() {
        assert_eq!(
            config_root_dir(Path::new("configs/Rewatch.toml")),
            PathBuf::from("configs")
        );
        assert!(config_root_dir(Path::new("Rewatch.toml")).is_absolute());
    }
}
