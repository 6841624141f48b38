// src/watch/enumerate.rs

//! Turning configured directories/files into a flat list of watch targets.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::errors::{Result, RewatchError};
use crate::fs::FileSystem;
use crate::watch::settings::WatchSettings;
use crate::watch::target::{TargetKind, WatchTarget};

/// Walk every configured directory and collect the watch targets.
///
/// - An excluded directory is skipped together with its whole subtree.
/// - A directory becomes a target only if it directly holds at least one
///   non-directory entry; the walk still descends into its subdirectories.
/// - Individually configured files are always added, unless their parent
///   directory is already a target: that watch covers them.
///
/// Targets come out in walk order (roots in configuration order, entries
/// sorted by name), followed by the configured files. Paths are
/// canonicalized and each path is registered at most once.
pub fn collect_targets(fs: &dyn FileSystem, settings: &WatchSettings) -> Result<Vec<WatchTarget>> {
    let excluded = resolve_excluded(fs, &settings.excluded_directories)?;
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut targets: Vec<WatchTarget> = Vec::new();

    for dir in &settings.directories {
        let root = resolve_existing(fs, dir, "watch directory")?;
        if !fs.is_dir(&root) {
            return Err(RewatchError::ConfigError(format!(
                "watch directory {:?} is not a directory",
                dir
            )));
        }
        walk(fs, &root, &excluded, &mut seen, &mut targets)?;
    }

    for file in &settings.files {
        let path = resolve_existing(fs, file, "watch file")?;
        if covered_by_directory(&targets, &path) {
            debug!(path = ?path, "file already covered by its directory target");
            continue;
        }
        if seen.insert(path.clone()) {
            debug!(path = ?path, "adding file target");
            targets.push(WatchTarget::file(path));
        }
    }

    Ok(targets)
}

fn covered_by_directory(targets: &[WatchTarget], file: &Path) -> bool {
    file.parent().is_some_and(|parent| {
        targets
            .iter()
            .any(|t| t.kind() == TargetKind::Directory && t.path() == parent)
    })
}

fn walk(
    fs: &dyn FileSystem,
    root: &Path,
    excluded: &HashSet<PathBuf>,
    seen: &mut HashSet<PathBuf>,
    targets: &mut Vec<WatchTarget>,
) -> Result<()> {
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if excluded.contains(&dir) {
            debug!(dir = ?dir, "skipping excluded directory");
            continue;
        }

        let mut entries = fs.read_dir(&dir)?;
        entries.sort();

        let (subdirs, others): (Vec<PathBuf>, Vec<PathBuf>) =
            entries.into_iter().partition(|p| fs.is_dir(p));

        if others.is_empty() {
            trace!(dir = ?dir, "directory has no files; not watched itself");
        } else if seen.insert(dir.clone()) {
            debug!(dir = ?dir, files = others.len(), "adding directory target");
            targets.push(WatchTarget::directory(dir.clone()));
        }

        // Reverse so the stack pops subdirectories in sorted order.
        stack.extend(subdirs.into_iter().rev());
    }

    Ok(())
}

fn resolve_existing(fs: &dyn FileSystem, path: &Path, what: &str) -> Result<PathBuf> {
    if !fs.exists(path) {
        return Err(RewatchError::ConfigError(format!(
            "{what} {:?} does not exist",
            path
        )));
    }
    Ok(fs.canonicalize(path)?)
}

/// Bring exclusions into the same form as walked paths. Exclusions that do
/// not exist cannot match anything but are kept in absolute form anyway.
fn resolve_excluded(fs: &dyn FileSystem, excluded: &[PathBuf]) -> Result<HashSet<PathBuf>> {
    let mut resolved = HashSet::with_capacity(excluded.len());
    for path in excluded {
        if fs.exists(path) {
            resolved.insert(fs.canonicalize(path)?);
        } else {
            resolved.insert(std::path::absolute(path)?);
        }
    }
    Ok(resolved)
}
