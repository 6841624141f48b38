// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rewatch::errors::Result;
use rewatch::watch::Watcher;

pub use rewatch_test_utils::init_tracing;

/// Run `watcher` on its own thread and wait until its start hook fired.
///
/// Panics if registration doesn't finish within 5 seconds; the join handle
/// yields whatever `start` eventually returns.
pub fn start_watcher(mut watcher: Watcher) -> JoinHandle<Result<()>> {
    let (started_tx, started_rx) = mpsc::channel();
    watcher.on_start(move || {
        let _ = started_tx.send(());
    });

    let handle = thread::spawn(move || watcher.start());
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("watcher did not finish registration in time");
    handle
}

/// Poll `cond` every 10 ms until it holds or `limit` elapses.
pub fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    cond()
}
