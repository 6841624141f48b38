use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rewatch::supervisor::{BoxFuture, BuildReport, ProcessBackend, StopOutcome};

/// Child handle produced by [`FakeProcessBackend`].
#[derive(Debug)]
pub struct FakeChild {
    pub id: usize,
}

#[derive(Debug, Default)]
struct FakeState {
    builds: usize,
    spawned: usize,
    stopped: usize,
    live: usize,
    max_live: usize,
    build_results: VecDeque<BuildReport>,
    log: Vec<String>,
}

/// A fake process backend that:
/// - records every build / spawn / stop in order
/// - tracks how many children are alive at once
/// - replays scripted build results (success once the script runs out).
///
/// Clones share the same state, so keep one clone to inspect after handing
/// the other to the supervisor.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessBackend {
    state: Arc<Mutex<FakeState>>,
    build_delay: Duration,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue build results, consumed one per build.
    pub fn with_build_results(self, results: impl IntoIterator<Item = BuildReport>) -> Self {
        self.state.lock().unwrap().build_results.extend(results);
        self
    }

    /// Make every build take `delay`, so events can pile up meanwhile.
    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = delay;
        self
    }

    pub fn builds(&self) -> usize {
        self.state.lock().unwrap().builds
    }

    pub fn spawned(&self) -> usize {
        self.state.lock().unwrap().spawned
    }

    pub fn stopped(&self) -> usize {
        self.state.lock().unwrap().stopped
    }

    /// Children currently alive.
    pub fn live(&self) -> usize {
        self.state.lock().unwrap().live
    }

    /// Highest number of children ever alive at the same time.
    pub fn max_live(&self) -> usize {
        self.state.lock().unwrap().max_live
    }

    /// e.g. `["build", "spawn#1", "stop#1", "build", "spawn#2"]`
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }
}

impl ProcessBackend for FakeProcessBackend {
    type Child = FakeChild;

    fn build(&mut self) -> BoxFuture<'_, anyhow::Result<BuildReport>> {
        let state = Arc::clone(&self.state);
        let delay = self.build_delay;

        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let mut guard = state.lock().unwrap();
            guard.builds += 1;
            guard.log.push("build".to_string());
            Ok(guard
                .build_results
                .pop_front()
                .unwrap_or_else(BuildReport::succeeded))
        })
    }

    fn spawn(&mut self) -> BoxFuture<'_, anyhow::Result<FakeChild>> {
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            guard.spawned += 1;
            guard.live += 1;
            guard.max_live = guard.max_live.max(guard.live);
            let id = guard.spawned;
            guard.log.push(format!("spawn#{id}"));
            Ok(FakeChild { id })
        })
    }

    fn stop(&mut self, child: FakeChild) -> BoxFuture<'_, anyhow::Result<StopOutcome>> {
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            guard.stopped += 1;
            guard.live -= 1;
            guard.log.push(format!("stop#{}", child.id));
            Ok(StopOutcome::Killed)
        })
    }
}
