// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { modified: SystemTime },
    Dir { children: Vec<String>, modified: SystemTime },
}

/// In-memory filesystem for enumeration and polling tests.
///
/// Paths are used verbatim (no normalisation); tests should stick to
/// absolute paths such as `/project/src`.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file with a modification time of `UNIX_EPOCH`.
    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.add_file_at(path, SystemTime::UNIX_EPOCH);
    }

    pub fn add_file_at(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(path.clone(), MockEntry::File { modified });
        Self::link_into_parent(&mut entries, &path);
    }

    /// Add an (empty) directory and any missing ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_dir_entry(&mut entries, path.as_ref());
    }

    /// Bump the modification time of `path` by `by`.
    pub fn touch(&self, path: impl AsRef<Path>, by: Duration) {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified }) | Some(MockEntry::Dir { modified, .. }) => {
                *modified += by;
            }
            None => {}
        }
    }

    /// Remove `path` (and, for directories, everything below it).
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            if let Some(MockEntry::Dir { children, .. }) = entries.get_mut(parent) {
                let name = name.to_string_lossy();
                children.retain(|c| c.as_str() != name.as_ref());
            }
        }
    }

    fn link_into_parent(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if parent.as_os_str().is_empty() || parent == path {
            return;
        }
        Self::ensure_dir_entry(entries, parent);
        if let Some(MockEntry::Dir { children, .. }) = entries.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if entries.contains_key(path) {
            return;
        }
        entries.insert(
            path.to_path_buf(),
            MockEntry::Dir {
                children: Vec::new(),
                modified: SystemTime::UNIX_EPOCH,
            },
        );
        Self::link_into_parent(entries, path);
    }

    fn not_found(path: &Path) -> anyhow::Error {
        anyhow::Error::new(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such file or directory: {:?}", path),
        ))
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.entries.lock().unwrap().get(path),
            Some(MockEntry::Dir { .. })
        )
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.entries.lock().unwrap().get(path),
            Some(MockEntry::File { .. })
        )
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Tests use absolute paths, so the path is already canonical; we only
        // check that it exists.
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(Self::not_found(path))
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::Dir { children, .. }) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            Some(MockEntry::File { .. }) => Err(anyhow!("Not a directory: {:?}", path)),
            None => Err(Self::not_found(path)),
        }
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        match self.entries.lock().unwrap().get(path) {
            Some(MockEntry::File { modified }) | Some(MockEntry::Dir { modified, .. }) => {
                Ok(*modified)
            }
            None => Err(Self::not_found(path)),
        }
    }
}
