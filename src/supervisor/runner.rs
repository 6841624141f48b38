// src/supervisor/runner.rs

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::Result;
use crate::watch::Watcher;

use super::backend::{ProcessBackend, TokioProcessBackend};
use super::command::SupervisorSettings;
use super::lifecycle::{ProcessLifecycle, SupervisorEvent};
use super::signals::shutdown_signal;

/// Builds and runs one program, restarting it whenever the bound watcher
/// reports a change.
///
/// Construction binds the watcher and starts nothing.
pub struct Supervisor<B: ProcessBackend = TokioProcessBackend> {
    watcher: Watcher,
    backend: B,
}

impl<B: ProcessBackend> fmt::Debug for Supervisor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("watcher", &self.watcher)
            .finish_non_exhaustive()
    }
}

impl Supervisor<TokioProcessBackend> {
    /// Supervise `entry` with the default build and run commands.
    pub fn new(entry: impl Into<PathBuf>, watcher: Watcher) -> Self {
        Self::with_settings(SupervisorSettings::new(entry), watcher)
    }

    pub fn with_settings(settings: SupervisorSettings, watcher: Watcher) -> Self {
        Self::with_backend(TokioProcessBackend::new(settings), watcher)
    }
}

impl<B: ProcessBackend> Supervisor<B> {
    pub fn with_backend(backend: B, watcher: Watcher) -> Self {
        Self { watcher, backend }
    }

    /// Run until Ctrl-C / SIGTERM or a fatal watcher error.
    pub async fn start(self) -> Result<()> {
        self.start_with_shutdown(shutdown_signal()).await
    }

    /// Like [`Supervisor::start`], but `shutdown` decides when to stop.
    ///
    /// The watcher runs on its own OS thread since its loop blocks forever.
    /// Its hooks only send events to the lifecycle actor, which runs on the
    /// calling task and owns the child process. Returns the watcher's error
    /// if it exits, `Ok` on shutdown.
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            mut watcher,
            backend,
        } = self;
        let (tx, rx) = mpsc::unbounded_channel();

        let start_tx = tx.clone();
        watcher.on_start(move || {
            let _ = start_tx.send(SupervisorEvent::Start);
        });

        let trigger_tx = tx.clone();
        watcher.on_trigger(move |path: &Path| {
            let _ = trigger_tx.send(SupervisorEvent::Trigger(path.to_path_buf()));
        });

        let exit_tx = tx.clone();
        thread::Builder::new()
            .name("rewatch-watcher".to_string())
            .spawn(move || {
                let res = watcher.start();
                let _ = exit_tx.send(SupervisorEvent::WatcherExited(res));
            })?;

        let shutdown_tx = tx;
        let shutdown_task = tokio::spawn(async move {
            shutdown.await;
            debug!("shutdown future resolved");
            let _ = shutdown_tx.send(SupervisorEvent::Shutdown);
        });

        let result = ProcessLifecycle::new(backend).run(rx).await;
        shutdown_task.abort();
        result
    }
}
