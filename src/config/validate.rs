// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, SupervisorSection, WatchSection};
use crate::errors::{Result, RewatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RewatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.supervisor))
    }
}

/// Run every check against an already-parsed config.
pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    // Nothing is watched or run when live reload is off.
    if !cfg.supervisor.enabled {
        return Ok(());
    }
    validate_watch_section(&cfg.watch)?;
    validate_supervisor_section(&cfg.supervisor)?;
    Ok(())
}

fn validate_watch_section(watch: &WatchSection) -> Result<()> {
    if watch.directories.is_empty() && watch.files.is_empty() {
        return Err(RewatchError::ConfigError(
            "[watch] needs at least one entry in `directories` or `files`".to_string(),
        ));
    }

    if watch.poll_interval_ms == 0 {
        return Err(RewatchError::ConfigError(
            "[watch].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if !watch.mode.is_supported() {
        return Err(RewatchError::ConfigError(format!(
            "[watch].mode = \"{}\" is not available on this platform",
            watch.mode
        )));
    }

    for path in watch.directories.iter().chain(&watch.files).chain(&watch.exclude) {
        if path.as_os_str().is_empty() {
            return Err(RewatchError::ConfigError(
                "[watch] contains an empty path".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_supervisor_section(sup: &SupervisorSection) -> Result<()> {
    if sup.entry_point.as_os_str().is_empty() {
        return Err(RewatchError::ConfigError(
            "[supervisor].entry_point must not be empty".to_string(),
        ));
    }

    // `build` / `run` can't be empty: CommandSpec rejects that while
    // deserializing.
    Ok(())
}
