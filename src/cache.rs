//! Tree cache keyed by root directory.
//!
//! Entries live in memory for the lifetime of the process and, when a cache
//! directory is configured, as one JSON file per root. File names are the
//! MD5 digest of the absolute root path, so they are stable across sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tree::{Entry, Tree};

/// Bump when the on-disk layout changes; older files are ignored.
const CACHE_VERSION: u32 = 1;

/// On-disk representation of one cached tree.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    root: PathBuf,
    tree: Entry,
}

/// In-memory plus optional on-disk tree cache.
#[derive(Debug, Default)]
pub struct CacheStore {
    directory: Option<PathBuf>,
    entries: HashMap<PathBuf, Entry>,
}

impl CacheStore {
    /// Cache persisting into `directory`.
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory: Some(directory),
            entries: HashMap::new(),
        }
    }

    /// Cache that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Deterministic cache file location for `root`.
    pub fn file_for(&self, root: &Path) -> Option<PathBuf> {
        let digest = md5::compute(root.to_string_lossy().as_bytes());
        self.directory
            .as_ref()
            .map(|dir| dir.join(format!("{:x}.json", digest)))
    }

    /// Store the canonical form of `tree` for `root`, replacing any previous
    /// entry, and write it to disk when persistence is enabled.
    pub fn save(&mut self, root: &Path, tree: &Tree) -> Result<()> {
        let entry = tree.canonical();
        if let (Some(dir), Some(path)) = (self.directory.as_ref(), self.file_for(root)) {
            fs::create_dir_all(dir)?;
            let file = CacheFile {
                version: CACHE_VERSION,
                root: root.to_path_buf(),
                tree: entry.clone(),
            };
            fs::write(&path, serde_json::to_string_pretty(&file)?)?;
            log::debug!("cached tree for {} at {}", root.display(), path.display());
        }
        self.entries.insert(root.to_path_buf(), entry);
        Ok(())
    }

    /// Cached tree for `root`: memory first, then disk (which also fills the
    /// memory entry). Unreadable or foreign files count as a miss.
    pub fn load(&mut self, root: &Path) -> Option<Tree> {
        if let Some(entry) = self.entries.get(root) {
            return Some(Tree::from_entry(entry.clone()));
        }

        let path = self.file_for(root)?;
        let content = fs::read_to_string(&path).ok()?;
        let file: CacheFile = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("ignoring unreadable cache file {}: {}", path.display(), e);
                return None;
            }
        };
        if file.version != CACHE_VERSION || file.root != root {
            log::warn!("ignoring stale cache file {}", path.display());
            return None;
        }

        log::info!("loaded cached tree for {} from disk", root.display());
        self.entries.insert(root.to_path_buf(), file.tree.clone());
        Some(Tree::from_entry(file.tree))
    }

    /// Forget every entry and delete every file in the cache directory.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        let Some(dir) = &self.directory else {
            return Ok(());
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}
