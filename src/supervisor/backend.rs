// src/supervisor/backend.rs

//! Pluggable process backend abstraction.
//!
//! The lifecycle actor talks to a `ProcessBackend` instead of spawning
//! processes itself. Production code uses [`TokioProcessBackend`]; tests can
//! provide a fake that records live children without touching the OS.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use super::command::{CommandSpec, SupervisorSettings};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of one build invocation that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub success: bool,
    /// Exit code, `None` if the build was killed by a signal.
    pub status: Option<i32>,
    /// Everything the build wrote to standard error.
    pub diagnostics: String,
}

impl BuildReport {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            status: Some(0),
            diagnostics: String::new(),
        }
    }

    pub fn failed(status: Option<i32>, diagnostics: impl Into<String>) -> Self {
        Self {
            success: false,
            status,
            diagnostics: diagnostics.into(),
        }
    }
}

/// How a stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The child had already exited; it was only reaped.
    AlreadyExited,
    /// The child exited within the grace period after SIGTERM.
    Terminated,
    /// The child was killed forcefully.
    Killed,
}

/// Trait abstracting how the supervised program is built, started and
/// stopped.
///
/// Errors are returned as `anyhow` errors; the lifecycle logs them and keeps
/// going, none of them ends the session.
pub trait ProcessBackend: Send {
    type Child: Send;

    /// Run the build command to completion.
    fn build(&mut self) -> BoxFuture<'_, Result<BuildReport>>;

    /// Start the built artifact.
    fn spawn(&mut self) -> BoxFuture<'_, Result<Self::Child>>;

    /// Stop `child` and wait until it is reaped.
    fn stop(&mut self, child: Self::Child) -> BoxFuture<'_, Result<StopOutcome>>;
}

/// Real backend: runs the configured commands with `tokio::process`.
#[derive(Debug, Clone)]
pub struct TokioProcessBackend {
    settings: SupervisorSettings,
}

impl TokioProcessBackend {
    pub fn new(settings: SupervisorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }
}

impl ProcessBackend for TokioProcessBackend {
    type Child = Child;

    fn build(&mut self) -> BoxFuture<'_, Result<BuildReport>> {
        let spec = self.settings.build_command();

        Box::pin(async move {
            info!(cmd = %spec, "building");

            let mut child = command_for(&spec)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| format!("spawning build command `{spec}`"))?;

            let mut diagnostics = Vec::new();
            if let Some(mut stderr) = child.stderr.take() {
                let mut mirror = tokio::io::stderr();
                let mut chunk = [0u8; 4096];
                loop {
                    let n = stderr
                        .read(&mut chunk)
                        .await
                        .context("reading build stderr")?;
                    if n == 0 {
                        break;
                    }
                    diagnostics.extend_from_slice(&chunk[..n]);
                    // Mirroring is best effort; the buffer is what gets logged.
                    let _ = mirror.write_all(&chunk[..n]).await;
                }
                let _ = mirror.flush().await;
            }

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for build command `{spec}`"))?;

            debug!(?status, "build finished");
            Ok(BuildReport {
                success: status.success(),
                status: status.code(),
                diagnostics: String::from_utf8_lossy(&diagnostics).into_owned(),
            })
        })
    }

    fn spawn(&mut self) -> BoxFuture<'_, Result<Child>> {
        let spec = self.settings.run_command();

        Box::pin(async move {
            let child = command_for(&spec)
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| format!("starting `{spec}`"))?;

            info!(cmd = %spec, pid = ?child.id(), "started child process");
            Ok(child)
        })
    }

    fn stop(&mut self, mut child: Child) -> BoxFuture<'_, Result<StopOutcome>> {
        let grace = self.settings.stop_timeout;

        Box::pin(async move {
            let pid = child.id();

            if let Some(status) = child.try_wait().context("polling child status")? {
                debug!(?pid, ?status, "child had already exited");
                return Ok(StopOutcome::AlreadyExited);
            }

            if let Some(grace) = grace.filter(|_| send_terminate(&child)) {
                match tokio::time::timeout(grace, child.wait()).await {
                    Ok(status) => {
                        let status = status.context("waiting for child after SIGTERM")?;
                        info!(?pid, ?status, "child exited after SIGTERM");
                        return Ok(StopOutcome::Terminated);
                    }
                    Err(_) => {
                        warn!(
                            ?pid,
                            grace_ms = grace.as_millis() as u64,
                            "child did not exit after SIGTERM; killing"
                        );
                    }
                }
            }

            // `kill` also waits, so the process table entry is gone afterwards.
            child.kill().await.context("killing child process")?;
            info!(?pid, "child killed");
            Ok(StopOutcome::Killed)
        })
    }
}

fn command_for(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(spec.program());
    cmd.args(spec.args());
    cmd
}

#[cfg(unix)]
fn send_terminate(child: &Child) -> bool {
    let Some(pid) = child.id() else {
        return false;
    };
    // SAFETY: `pid` belongs to a child we haven't reaped yet, so it can't
    // have been recycled for another process.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        warn!(pid, error = %io::Error::last_os_error(), "failed to send SIGTERM");
        return false;
    }
    true
}

#[cfg(not(unix))]
fn send_terminate(_child: &Child) -> bool {
    false
}

