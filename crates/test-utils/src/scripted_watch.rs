use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rewatch::errors::Result;
use rewatch::watch::{TriggerHook, WatchBackend, WatchTarget};

#[derive(Debug, Clone)]
pub enum Step {
    /// Fire the trigger hook with this path.
    Trigger(PathBuf),
    /// Sleep on the watch thread.
    Pause(Duration),
}

/// A watch backend that replays a fixed script instead of observing the
/// filesystem.
///
/// After the script it either returns the configured outcome or, with
/// [`ScriptedWatchBackend::hold_open`], blocks like a real backend would.
pub struct ScriptedWatchBackend {
    steps: Vec<Step>,
    outcome: Option<Result<()>>,
    hold_open: bool,
    registered: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedWatchBackend {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            outcome: None,
            hold_open: false,
            registered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Return `outcome` from `run` once the script is done.
    pub fn ending_with(mut self, outcome: Result<()>) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Never return from `run`.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Paths passed to `register`, shared with the backend.
    pub fn registered(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.registered)
    }
}

impl WatchBackend for ScriptedWatchBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn register(&mut self, targets: Vec<WatchTarget>) -> Result<()> {
        let mut registered = self.registered.lock().unwrap();
        registered.extend(targets.iter().map(|t| t.path().to_path_buf()));
        Ok(())
    }

    fn run(&mut self, on_trigger: TriggerHook) -> Result<()> {
        for step in &self.steps {
            match step {
                Step::Trigger(path) => on_trigger(path.as_path()),
                Step::Pause(d) => thread::sleep(*d),
            }
        }

        if self.hold_open {
            loop {
                thread::park();
            }
        }
        self.outcome.take().unwrap_or(Ok(()))
    }
}
