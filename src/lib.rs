// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod supervisor;
pub mod types;
pub mod watch;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{config_root_dir, CliArgs};
use crate::config::{default_config_path, load_from_path, load_or_default, ConfigFile};
use crate::supervisor::{Supervisor, SupervisorSettings};
use crate::watch::Watcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - the watcher
/// - the supervisor (build / run / restart)
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    // An explicitly named config must exist; the default one may not.
    let (config_path, mut raw) = match &args.config {
        Some(path) => (path.clone(), load_from_path(path)?),
        None => {
            let path = default_config_path();
            let raw = load_or_default(&path)?;
            (path, raw)
        }
    };

    args.apply_overrides(&mut raw);
    let cfg = ConfigFile::try_from(raw)?;

    if !cfg.supervisor.enabled {
        info!("live reload is disabled ([supervisor].enabled = false); nothing to do");
        return Ok(());
    }

    let root = config_root_dir(&config_path);
    let watcher = Watcher::new(cfg.watch_settings(&root));
    let settings = cfg.supervisor_settings(&root);

    if args.dry_run {
        print_dry_run(&watcher, &settings)?;
        return Ok(());
    }

    info!(
        entry = ?settings.entry,
        build = %settings.build_command(),
        run = %settings.run_command(),
        "starting live reload"
    );
    Supervisor::with_settings(settings, watcher).start().await?;
    Ok(())
}

/// Simple dry-run output: print targets and commands.
fn print_dry_run(watcher: &Watcher, settings: &SupervisorSettings) -> Result<()> {
    let watch = watcher.settings();
    let targets = watcher.targets()?;

    println!("rewatch dry-run");
    println!("  mode = {} (resolves to {})", watch.mode, watch.mode.resolve());
    println!("  debounce = {} ms", watch.debounce.as_millis());
    println!("  poll_interval = {} ms", watch.poll_interval.as_millis());
    if !watch.excluded_directories.is_empty() {
        println!("  exclude = {:?}", watch.excluded_directories);
    }
    println!();

    println!("targets ({}):", targets.len());
    for target in &targets {
        println!("  - {:?} {}", target.kind(), target.path().display());
    }
    println!();

    println!("entry: {}", settings.entry.display());
    println!("build: {}", settings.build_command());
    println!("run:   {}", settings.run_command());
    if let Some(grace) = settings.stop_timeout {
        println!("stop:  SIGTERM, then SIGKILL after {} ms", grace.as_millis());
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
