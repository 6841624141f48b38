// tests/shutdown_signal.rs
//
// Delivers a real SIGTERM to this test process. Kept in its own binary so no
// other test shares the process while the signal is in flight.

#![cfg(unix)]

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};

use rewatch::supervisor::shutdown_signal;
use rewatch_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn sigterm_resolves_the_shutdown_listener() -> TestResult {
    init_tracing();
    // Holding a listener of our own keeps SIGTERM from taking the default
    // action while the one under test is still being installed.
    let _guard = signal(SignalKind::terminate())?;

    let listener = tokio::spawn(shutdown_signal());

    with_timeout(async {
        while !listener.is_finished() {
            // SAFETY: raising a signal we have a handler for.
            unsafe {
                libc::raise(libc::SIGTERM);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    listener.await?;
    Ok(())
}
