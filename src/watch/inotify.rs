// src/watch/inotify.rs

//! Push-based backend talking to inotify(7) directly.
//!
//! One descriptor per session, one watch per target. The event loop blocks
//! in `read(2)` on the descriptor and hands each buffer to
//! [`parse_events`].

use std::collections::HashMap;
use std::ffi::{CString, OsStr};
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::errors::{Result, RewatchError};
use crate::watch::event_buffer::{mask, parse_events, EVENT_HEADER_LEN};
use crate::watch::target::{WatchHandle, WatchTarget};
use crate::watch::watcher::{TriggerHook, WatchBackend};

/// Room for a few dozen records with maximum-length names (NAME_MAX + NUL).
const READ_BUFFER_LEN: usize = 32 * (EVENT_HEADER_LEN + 256);

/// Delete-then-create saves leave the path briefly missing.
const REWATCH_ATTEMPTS: u32 = 5;
const REWATCH_BACKOFF: Duration = Duration::from_millis(20);

pub struct InotifyBackend {
    inotify: File,
    targets: HashMap<WatchHandle, WatchTarget>,
    debounce: Duration,
}

impl InotifyBackend {
    /// Initialise the inotify instance. Fails if the kernel refuses (e.g.
    /// the per-user instance limit is reached).
    pub fn new(debounce: Duration) -> Result<Self> {
        // SAFETY: plain syscall, no pointers involved.
        let fd = unsafe { libc::inotify_init1(libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(RewatchError::IoError(io::Error::last_os_error()));
        }
        // SAFETY: `fd` was just returned by inotify_init1 and is owned by
        // nobody else.
        let owned = unsafe { OwnedFd::from_raw_fd(fd) };

        Ok(Self {
            inotify: File::from(owned),
            targets: HashMap::new(),
            debounce,
        })
    }

    fn add_watch(&self, path: &Path) -> io::Result<WatchHandle> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // SAFETY: the descriptor is open for the lifetime of `self` and
        // `c_path` is a valid NUL-terminated string.
        let wd = unsafe {
            libc::inotify_add_watch(self.inotify.as_raw_fd(), c_path.as_ptr(), mask::WATCH_MASK)
        };
        if wd < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(WatchHandle(wd))
        }
    }

    /// Parse one read's worth of records and fire the hook for every
    /// accepted change.
    fn dispatch(&mut self, buf: &[u8], on_trigger: &TriggerHook) -> Result<()> {
        for event in parse_events(buf)? {
            if event.is_overflow() {
                warn!("inotify queue overflowed; some change events were lost");
                continue;
            }
            if event.is_ignored() {
                self.rewatch(event.wd, on_trigger)?;
                continue;
            }
            if !event.is_change() {
                trace!(wd = event.wd, mask = event.mask, "ignoring non-change record");
                continue;
            }

            let Some(target) = self.targets.get_mut(&WatchHandle(event.wd)) else {
                debug!(wd = event.wd, "event for unknown watch handle");
                continue;
            };

            let name = Path::new(OsStr::from_bytes(event.name));
            fire(target, Some(name), self.debounce, on_trigger);
        }
        Ok(())
    }

    /// The kernel dropped a watch because its inode went away, usually an
    /// editor renaming a fresh file over the target. Watch whatever sits at
    /// the path now and count the replacement as a change. A path that
    /// stays gone can no longer be observed, which is fatal.
    fn rewatch(&mut self, wd: i32, on_trigger: &TriggerHook) -> Result<()> {
        let Some(mut target) = self.targets.remove(&WatchHandle(wd)) else {
            trace!(wd, "ignored record for an untracked watch");
            return Ok(());
        };

        let handle = self
            .add_watch_retrying(target.path())
            .map_err(|source| RewatchError::Registration {
                path: target.path().to_path_buf(),
                source,
            })?;

        if let Some(existing) = self.targets.get(&handle) {
            warn!(
                path = ?target.path(),
                existing = ?existing.path(),
                %handle,
                "replacement is already watched under another name"
            );
            return Ok(());
        }

        debug!(path = ?target.path(), old = wd, %handle, "watch re-added after the kernel dropped it");
        target.set_handle(handle);
        fire(&mut target, None, self.debounce, on_trigger);
        self.targets.insert(handle, target);
        Ok(())
    }

    fn add_watch_retrying(&self, path: &Path) -> io::Result<WatchHandle> {
        let mut attempt = 1;
        loop {
            match self.add_watch(path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound && attempt < REWATCH_ATTEMPTS => {
                    trace!(path = ?path, attempt, "path missing; retrying watch");
                    attempt += 1;
                    std::thread::sleep(REWATCH_BACKOFF);
                }
                other => return other,
            }
        }
    }
}

fn fire(target: &mut WatchTarget, name: Option<&Path>, window: Duration, on_trigger: &TriggerHook) {
    if !target.debounce().is_ready(Instant::now(), window) {
        trace!(path = ?target.path(), "event inside debounce window; dropped");
        return;
    }

    let changed = target.trigger_path(name);
    info!(path = ?changed, "change detected");
    on_trigger(&changed);
    target.debounce_mut().mark(Instant::now());
}

impl WatchBackend for InotifyBackend {
    fn name(&self) -> &'static str {
        "inotify"
    }

    fn register(&mut self, targets: Vec<WatchTarget>) -> Result<()> {
        for mut target in targets {
            let handle = self
                .add_watch(target.path())
                .map_err(|source| RewatchError::Registration {
                    path: target.path().to_path_buf(),
                    source,
                })?;

            if let Some(existing) = self.targets.get(&handle) {
                // Same inode reached through two paths; the kernel hands back
                // the same descriptor.
                warn!(
                    path = ?target.path(),
                    existing = ?existing.path(),
                    %handle,
                    "path already watched under another name"
                );
                continue;
            }

            target.set_handle(handle);
            debug!(path = ?target.path(), %handle, "inotify watch added");
            self.targets.insert(handle, target);
        }
        Ok(())
    }

    fn run(&mut self, on_trigger: TriggerHook) -> Result<()> {
        let mut buf = vec![0u8; READ_BUFFER_LEN];
        loop {
            let n = match self.inotify.read(&mut buf) {
                Ok(0) => {
                    return Err(RewatchError::EventRead(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "inotify descriptor returned end of file",
                    )));
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(RewatchError::EventRead(e)),
            };
            trace!(bytes = n, "read inotify records");
            self.dispatch(&buf[..n], &on_trigger)?;
        }
    }
}
