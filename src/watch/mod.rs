// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Turning the configured directories / files / exclusions into a flat,
//!   deduplicated list of watch targets.
//! - Registering those targets with a change-detection backend (raw
//!   inotify, the cross-platform `notify` crate, or mtime polling).
//! - Debouncing per target and reporting accepted changes to a callback.
//!
//! It does **not** know about builds or processes; the supervisor wires
//! the callbacks to its own lifecycle.

pub mod enumerate;
pub mod event_buffer;
#[cfg(target_os = "linux")]
pub mod inotify;
pub mod notify_backend;
pub mod poll;
pub mod settings;
pub mod target;
pub mod watcher;

pub use enumerate::collect_targets;
pub use settings::{WatchSettings, DEFAULT_POLL_INTERVAL};
pub use target::{DebounceState, Snapshot, TargetKind, WatchHandle, WatchTarget, DEFAULT_DEBOUNCE};
pub use watcher::{backend_for, StartHook, TriggerHook, WatchBackend, Watcher};
