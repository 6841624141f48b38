// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Errors that mean "some configured path is not actually being observed"
//! end up here and propagate out of `Watcher::start`. Failures confined to a
//! single rebuild cycle (build errors, kill/wait hiccups) are logged by the
//! supervisor instead and never surface as a `RewatchError`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("no watch targets found in the configured directories and files")]
    NoWatchTargets,

    #[error("failed to register watch for {path:?}: {source}")]
    Registration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("notification facility error: {0}")]
    Notify(#[from] notify::Error),

    #[error("malformed event buffer: {0}")]
    EventParse(String),

    #[error("error reading from notification descriptor: {0}")]
    EventRead(#[source] std::io::Error),

    #[error("every watch target disappeared; nothing left to observe")]
    AllTargetsLost,

    #[error("watch thread exited without reporting a result")]
    WatcherExited,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RewatchError>;
