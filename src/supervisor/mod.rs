// src/supervisor/mod.rs

//! Process supervision: build the entry point, run the artifact, and
//! restart it on every change the watcher reports.
//!
//! - `command`: argv descriptors with `{entry}` / `{artifact}` placeholders.
//! - `backend`: how processes are actually built, spawned and stopped.
//! - `lifecycle`: the actor that owns the single live child.
//! - `runner`: the public [`Supervisor`] wiring watcher hooks to the actor.

pub mod backend;
pub mod command;
pub mod lifecycle;
pub mod runner;
pub mod signals;

pub use backend::{BoxFuture, BuildReport, ProcessBackend, StopOutcome, TokioProcessBackend};
pub use command::{artifact_name, CommandSpec, SupervisorSettings};
pub use lifecycle::{ProcessLifecycle, SupervisorEvent};
pub use runner::Supervisor;
pub use signals::shutdown_signal;
