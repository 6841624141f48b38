// src/supervisor/lifecycle.rs

//! Single owner of the supervised child process.
//!
//! The watcher hooks and the signal listener never touch the child; they
//! send [`SupervisorEvent`]s and this actor applies them one at a time, so
//! at most one child is ever alive.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::Result;

use super::backend::ProcessBackend;

/// Input of the lifecycle actor.
#[derive(Debug)]
pub enum SupervisorEvent {
    /// Watch registration is done; build and start the first child.
    Start,
    /// An accepted change; stop, rebuild and restart.
    Trigger(PathBuf),
    /// Interrupt / terminate received.
    Shutdown,
    /// The watch thread returned; the session cannot continue.
    WatcherExited(Result<()>),
}

/// Events received in one burst, folded into one action.
#[derive(Default)]
struct Batch {
    triggers: usize,
    last_path: Option<PathBuf>,
    exit: Option<Result<()>>,
}

impl Batch {
    fn absorb(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Start => {}
            SupervisorEvent::Trigger(path) => {
                self.triggers += 1;
                self.last_path = Some(path);
            }
            SupervisorEvent::Shutdown => {
                if self.exit.is_none() {
                    info!("shutdown requested");
                    self.exit = Some(Ok(()));
                }
            }
            SupervisorEvent::WatcherExited(res) => {
                if self.exit.is_none() {
                    match &res {
                        Ok(()) => info!("watcher finished"),
                        Err(err) => error!(error = %err, "watcher stopped"),
                    }
                    self.exit = Some(res);
                }
            }
        }
    }
}

pub struct ProcessLifecycle<B: ProcessBackend> {
    backend: B,
    child: Option<B::Child>,
    starts: u64,
}

impl<B: ProcessBackend> fmt::Debug for ProcessLifecycle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessLifecycle")
            .field("running", &self.child.is_some())
            .field("starts", &self.starts)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> ProcessLifecycle<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            child: None,
            starts: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Build, then start the artifact if the build succeeded.
    ///
    /// A running child is stopped first. A failed build leaves no child
    /// behind; the next trigger retries.
    pub async fn start(&mut self) {
        self.stop().await;

        match self.backend.build().await {
            Ok(report) if report.success => debug!("build succeeded"),
            Ok(report) => {
                error!(
                    status = ?report.status,
                    diagnostics = %report.diagnostics.trim_end(),
                    "build failed; waiting for the next change"
                );
                return;
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "could not run build; waiting for the next change");
                return;
            }
        }

        match self.backend.spawn().await {
            Ok(child) => {
                self.child = Some(child);
                self.starts += 1;
            }
            Err(err) => error!(error = %format!("{err:#}"), "could not start child process"),
        }
    }

    /// Stop and reap the live child, if any. Failures are logged.
    pub async fn stop(&mut self) {
        let Some(child) = self.child.take() else {
            return;
        };
        match self.backend.stop(child).await {
            Ok(outcome) => debug!(?outcome, "child stopped"),
            Err(err) => warn!(error = %format!("{err:#}"), "failed to stop child process"),
        }
    }

    /// Stop, rebuild, restart.
    pub async fn restart(&mut self, changed: Option<&Path>) {
        info!(path = ?changed, "restarting");
        self.start().await;
    }

    /// Consume events until shutdown, a watcher exit, or every sender is
    /// gone. The child is always stopped before returning.
    ///
    /// Events that are already queued when one is received are handled
    /// together: any number of triggers collapses into one restart, and a
    /// shutdown in the same burst wins over the restart.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SupervisorEvent>) -> Result<()> {
        info!("supervisor started");

        while let Some(event) = events.recv().await {
            debug!(?event, "supervisor received event");

            let mut batch = Batch::default();
            batch.absorb(event);
            while let Ok(next) = events.try_recv() {
                batch.absorb(next);
            }

            if let Some(exit) = batch.exit {
                self.stop().await;
                info!("supervisor exiting");
                return exit;
            }

            if batch.triggers > 1 {
                debug!(coalesced = batch.triggers, "coalesced queued triggers");
            }
            if batch.triggers == 0 {
                self.start().await;
            } else {
                self.restart(batch.last_path.as_deref()).await;
            }
        }

        info!("supervisor event channel closed; stopping child");
        self.stop().await;
        Ok(())
    }
}
