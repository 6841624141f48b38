// src/supervisor/command.rs

//! Build / run command descriptors.
//!
//! Commands are argv lists, not shell strings. Two placeholders are expanded
//! in every element before spawning:
//!
//! - `{entry}`: the entry-point path as given (e.g. `cmd/server.go`)
//! - `{artifact}`: the entry point's file stem (e.g. `server`)

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const ENTRY_PLACEHOLDER: &str = "{entry}";
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";

/// Program plus arguments, possibly containing placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl TryFrom<Vec<String>> for CommandSpec {
    type Error = String;

    fn try_from(argv: Vec<String>) -> Result<Self, Self::Error> {
        let mut argv = argv.into_iter();
        match argv.next() {
            Some(program) if !program.trim().is_empty() => Ok(Self {
                program,
                args: argv.collect(),
            }),
            _ => Err("command must have a non-empty program as its first element".to_string()),
        }
    }
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `go build {entry}`
    pub fn default_build() -> Self {
        Self::new("go", ["build", ENTRY_PLACEHOLDER])
    }

    /// `./{artifact}`
    pub fn default_run() -> Self {
        Self::new(format!("./{ARTIFACT_PLACEHOLDER}"), Vec::<String>::new())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Substitute the placeholders for `entry`.
    pub fn expand(&self, entry: &Path) -> CommandSpec {
        let entry_str = entry.to_string_lossy();
        let artifact = artifact_name(entry);
        let subst = |s: &str| {
            s.replace(ENTRY_PLACEHOLDER, &entry_str)
                .replace(ARTIFACT_PLACEHOLDER, &artifact)
        };

        CommandSpec {
            program: subst(&self.program),
            args: self.args.iter().map(|a| subst(a)).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Name of the artifact produced from `entry`: its file stem.
///
/// `cmd/server.go` → `server`, `main.go` → `main`.
pub fn artifact_name(entry: &Path) -> String {
    entry
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "app".to_string())
}

/// Everything the process backend needs to build and run the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    pub entry: PathBuf,
    pub build: CommandSpec,
    pub run: CommandSpec,
    /// Grace period between SIGTERM and SIGKILL. `None` kills immediately.
    pub stop_timeout: Option<Duration>,
}

impl SupervisorSettings {
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            build: CommandSpec::default_build(),
            run: CommandSpec::default_run(),
            stop_timeout: None,
        }
    }

    pub fn build_command(&self) -> CommandSpec {
        self.build.expand(&self.entry)
    }

    pub fn run_command(&self) -> CommandSpec {
        self.run.expand(&self.entry)
    }
}
