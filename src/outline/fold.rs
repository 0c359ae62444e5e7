//! Path-keyed record of folded entries.
//!
//! Folds are remembered by absolute path rather than by line or node, so the
//! set survives a rebuild and is re-resolved against the new outline.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Folded paths of one root, most specific entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldSet {
    root: PathBuf,
    members: BTreeSet<PathBuf>,
}

/// Drop trailing separators and `.` components so `a/b/` and `a/b` agree.
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

impl FoldSet {
    pub fn new(root: &Path) -> Self {
        Self {
            root: normalize(root),
            members: BTreeSet::new(),
        }
    }

    /// Record `path` as folded. Members that are ancestors of `path` are
    /// dropped.
    pub fn add(&mut self, path: &Path) {
        let path = normalize(path);
        self.members
            .retain(|member| member == &path || !path.starts_with(member));
        self.members.insert(path);
    }

    /// Forget `path` and everything below it. When the parent is left with
    /// no folded descendant and is not the root, the parent is recorded
    /// instead.
    pub fn remove(&mut self, path: &Path) {
        let path = normalize(path);
        self.members.retain(|member| !member.starts_with(&path));

        let Some(parent) = path.parent() else {
            return;
        };
        if parent == self.root || !parent.starts_with(&self.root) {
            return;
        }
        if !self.members.iter().any(|member| member.starts_with(parent)) {
            self.members.insert(parent.to_path_buf());
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.contains(&normalize(path))
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Keep only the members accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.members.retain(|member| keep(member));
    }
}
