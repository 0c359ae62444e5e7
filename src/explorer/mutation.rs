//! Single-path mutations applied to the live tree without a rebuild.
//!
//! The filesystem call runs first; the tree is only touched once it has
//! succeeded. A running build is cancelled before the tree changes and its
//! partial result is dropped. Each operation reports whether it interrupted
//! a build so the caller can schedule a reconciling refresh.

use std::fs;
use std::path::{Path, PathBuf};

use super::Explorer;
use crate::builder::{root_name, sync};
use crate::cache::CacheStore;
use crate::error::{AppError, Result};
use crate::fs::operations;
use crate::tree::{relative_segments, Entry};

impl Explorer {
    /// Create an empty file at `path`.
    pub fn create_file(&mut self, path: &Path, cache: &mut CacheStore) -> Result<bool> {
        self.ensure_inside(path)?;
        operations::create_file(path)?;
        let interrupted = self.cancel_silently();
        self.add(path, None);
        self.commit(cache);
        Ok(interrupted)
    }

    /// Create an empty directory at `path`.
    pub fn create_dir(&mut self, path: &Path, cache: &mut CacheStore) -> Result<bool> {
        self.ensure_inside(path)?;
        operations::create_dir(path)?;
        let interrupted = self.cancel_silently();
        self.add(path, Some(Entry::Directory(String::new(), Vec::new())));
        self.commit(cache);
        Ok(interrupted)
    }

    /// Delete the file or directory at `path`.
    pub fn delete(&mut self, path: &Path, cache: &mut CacheStore) -> Result<bool> {
        self.ensure_inside(path)?;
        operations::delete(path)?;
        let interrupted = self.cancel_silently();
        self.remove(path);
        self.commit(cache);
        Ok(interrupted)
    }

    /// Move `from` to `to`, carrying the known subtree along.
    pub fn rename(&mut self, from: &Path, to: &Path, cache: &mut CacheStore) -> Result<bool> {
        self.ensure_inside(from)?;
        self.ensure_inside(to)?;
        let known = self.known_entry(from);
        operations::rename(from, to)?;
        let interrupted = self.cancel_silently();
        self.remove(from);
        let entry = match known {
            Some(entry) => entry,
            None => self.entry_from_disk(to)?,
        };
        self.add(to, Some(entry));
        self.commit(cache);
        Ok(interrupted)
    }

    /// Copy `from` to `to`, duplicating the known subtree.
    pub fn copy(&mut self, from: &Path, to: &Path, cache: &mut CacheStore) -> Result<bool> {
        self.ensure_inside(from)?;
        self.ensure_inside(to)?;
        let known = self.known_entry(from);
        operations::copy(from, to)?;
        let interrupted = self.cancel_silently();
        let entry = match known {
            Some(entry) => entry,
            None => self.entry_from_disk(to)?,
        };
        self.add(to, Some(entry));
        self.commit(cache);
        Ok(interrupted)
    }

    /// Reconcile paths reported by the watcher. A batch naming the root
    /// itself triggers a full refresh. Returns whether the tree changed.
    pub fn apply_fs_change(&mut self, paths: &[PathBuf], cache: &mut CacheStore) -> Result<bool> {
        if paths.iter().any(|p| p == &self.root) {
            self.refresh(cache)?;
            return Ok(true);
        }
        if self.is_building() {
            // The running build lists the current state anyway.
            return Ok(false);
        }

        let mut changed = false;
        for path in paths {
            changed |= self.reconcile(path);
        }
        if changed {
            self.commit(cache);
        }
        Ok(changed)
    }

    fn reconcile(&mut self, path: &Path) -> bool {
        let on_disk = fs::symlink_metadata(path).ok().map(|m| m.is_dir());
        let in_tree = self
            .tree
            .lookup(&self.root, path)
            .map(|id| self.tree.is_dir(id));

        match (on_disk, in_tree) {
            (None, None) => false,
            (None, Some(_)) => self.remove(path),
            (Some(disk_dir), Some(tree_dir)) if disk_dir == tree_dir => false,
            (Some(_), known) => {
                if known.is_some() {
                    self.remove(path);
                }
                match self.entry_from_disk(path) {
                    Ok(entry) => self.add(path, Some(entry)),
                    Err(e) => {
                        log::warn!("cannot reconcile {}: {}", path.display(), e);
                        false
                    }
                }
            }
        }
    }

    /// Tree-only insertion. Paths outside the root or under a missing parent
    /// are ignored.
    pub fn add(&mut self, path: &Path, entry: Option<Entry>) -> bool {
        if !self.is_inside(path) {
            log::warn!("not adding {}: outside {}", path.display(), self.root.display());
            return false;
        }
        self.tree.insert(&self.root, path, entry).is_some()
    }

    /// Tree-only removal; no-op when absent.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.tree.remove(&self.root, path).is_some()
    }

    fn is_inside(&self, path: &Path) -> bool {
        relative_segments(&self.root, path).is_some_and(|segments| !segments.is_empty())
    }

    fn ensure_inside(&self, path: &Path) -> Result<()> {
        if self.is_inside(path) {
            Ok(())
        } else {
            Err(AppError::OutsideRoot(path.to_path_buf()))
        }
    }

    fn known_entry(&self, path: &Path) -> Option<Entry> {
        self.tree
            .lookup(&self.root, path)
            .map(|id| self.tree.entry(id))
    }

    /// Subtree for an entry the tree does not know yet, listed from disk.
    fn entry_from_disk(&self, path: &Path) -> Result<Entry> {
        if fs::symlink_metadata(path)?.is_dir() {
            let subtree = sync::build(path, &self.settings.filter)?;
            Ok(subtree.entry(subtree.root()))
        } else {
            Ok(Entry::File(root_name(path)))
        }
    }

    /// Persist and re-render after a mutation.
    fn commit(&mut self, cache: &mut CacheStore) {
        self.tree.compact();
        self.save(cache);
        self.render();
    }
}
