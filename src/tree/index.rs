//! Path index: resolve absolute paths against a `Tree`.
//!
//! Paths are split into segments relative to the tree's root directory and
//! walked by name. The root itself can be looked up but never inserted or
//! removed.

use std::path::{Component, Path};

use super::model::{Entry, NodeId, Tree};

/// Segments of `path` relative to `root`, or `None` when `path` lies
/// outside `root`. A `..` component counts as outside, since it can climb
/// above the root.
pub fn relative_segments(root: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(segments)
}

/// Whether the path is spelled with a trailing directory separator.
pub fn has_dir_marker(path: &Path) -> bool {
    let text = path.as_os_str().to_string_lossy();
    text.ends_with('/') || text.ends_with(std::path::MAIN_SEPARATOR)
}

impl Tree {
    /// Find the node at `path`. The root directory resolves to the root node.
    pub fn lookup(&self, root: &Path, path: &Path) -> Option<NodeId> {
        let segments = relative_segments(root, path)?;
        let mut cursor = self.root();
        for segment in &segments {
            cursor = self.find_child(cursor, segment)?;
        }
        Some(cursor)
    }

    /// Resolve the branch that would hold `path`, plus the terminal name.
    fn parent_slot(&self, root: &Path, path: &Path) -> Option<(NodeId, String)> {
        let mut segments = relative_segments(root, path)?;
        let name = segments.pop()?;
        let mut cursor = self.root();
        for segment in &segments {
            match self.find_child(cursor, segment) {
                Some(child) if self.is_dir(child) => cursor = child,
                _ => {
                    log::warn!(
                        "no directory {:?} in tree while resolving {}",
                        segment,
                        path.display()
                    );
                    return None;
                }
            }
        }
        Some((cursor, name))
    }

    /// Attach a node at `path` under its (already existing) parent branch.
    ///
    /// Without an explicit `entry`, a path spelled with a trailing separator
    /// becomes an empty directory and anything else a file. A supplied entry
    /// is re-labelled with the terminal segment. Only the parent's children
    /// are re-sorted. Returns `None` when the path is outside the root, is
    /// the root, or its parent is missing.
    pub fn insert(&mut self, root: &Path, path: &Path, entry: Option<Entry>) -> Option<NodeId> {
        let (parent, name) = self.parent_slot(root, path)?;
        let entry = match entry {
            Some(entry) => entry.renamed(name),
            None if has_dir_marker(path) => Entry::Directory(name, Vec::new()),
            None => Entry::File(name),
        };
        let id = self.graft(parent, entry);
        self.sort_children(parent);
        Some(id)
    }

    /// Detach the node at `path`, returning its contents. No-op when absent.
    pub fn remove(&mut self, root: &Path, path: &Path) -> Option<Entry> {
        let (parent, name) = self.parent_slot(root, path)?;
        let id = self.detach(parent, &name)?;
        Some(self.entry(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn root() -> PathBuf {
        PathBuf::from("/work/proj")
    }

    fn sample() -> Tree {
        let mut tree = Tree::from_paths("proj", ["a/b/c.txt", "a/b/d.txt", "e.txt"]);
        tree.sort();
        tree
    }

    #[test]
    fn relative_segments_inside_root() {
        let segs = relative_segments(&root(), Path::new("/work/proj/a/b/c.txt")).unwrap();
        assert_eq!(segs, vec!["a", "b", "c.txt"]);
    }

    #[test]
    fn relative_segments_outside_root() {
        assert!(relative_segments(&root(), Path::new("/work/other/a")).is_none());
        assert!(relative_segments(&root(), Path::new("/work/projection")).is_none());
    }

    #[test]
    fn relative_segments_reject_parent_components() {
        assert!(relative_segments(&root(), Path::new("/work/proj/a/../../escape.txt")).is_none());
        assert!(relative_segments(&root(), Path::new("/work/proj/a/../b")).is_none());
        let segs = relative_segments(&root(), Path::new("/work/proj/./a")).unwrap();
        assert_eq!(segs, vec!["a"]);
    }

    #[test]
    fn dir_marker_detection() {
        assert!(has_dir_marker(Path::new("/work/proj/a/")));
        assert!(!has_dir_marker(Path::new("/work/proj/a")));
    }

    #[test]
    fn lookup_finds_nested_nodes() {
        let tree = sample();
        let found = tree.lookup(&root(), Path::new("/work/proj/a/b/d.txt")).unwrap();
        assert_eq!(tree.name(found), "d.txt");
        let dir = tree.lookup(&root(), Path::new("/work/proj/a/b/")).unwrap();
        assert!(tree.is_dir(dir));
    }

    #[test]
    fn lookup_root_and_missing() {
        let tree = sample();
        assert_eq!(tree.lookup(&root(), &root()), Some(tree.root()));
        assert!(tree.lookup(&root(), Path::new("/work/proj/a/zzz")).is_none());
        assert!(tree.lookup(&root(), Path::new("/elsewhere")).is_none());
    }

    #[test]
    fn insert_file_resorts_parent() {
        let mut tree = sample();
        tree.insert(&root(), Path::new("/work/proj/a/x.txt"), None).unwrap();
        assert_eq!(
            tree.flatten(),
            vec!["a/b/c.txt", "a/b/d.txt", "a/x.txt", "e.txt"]
        );
    }

    #[test]
    fn insert_directory_marker_creates_branch() {
        let mut tree = sample();
        let id = tree.insert(&root(), Path::new("/work/proj/new/"), None).unwrap();
        assert!(tree.is_dir(id));
        assert_eq!(tree.children(tree.root())[0], tree.find_child(tree.root(), "a").unwrap());
        assert_eq!(tree.name(tree.children(tree.root())[1]), "new");
    }

    #[test]
    fn insert_relabels_supplied_entry() {
        let mut tree = sample();
        let entry = Entry::Directory("old".into(), vec![Entry::File("f.rs".into())]);
        tree.insert(&root(), Path::new("/work/proj/a/moved"), Some(entry)).unwrap();
        assert!(tree.lookup(&root(), Path::new("/work/proj/a/moved/f.rs")).is_some());
        assert!(tree.lookup(&root(), Path::new("/work/proj/a/old")).is_none());
    }

    #[test]
    fn insert_under_missing_parent_is_refused() {
        let mut tree = sample();
        let before = tree.canonical();
        assert!(tree.insert(&root(), Path::new("/work/proj/nope/x.txt"), None).is_none());
        assert_eq!(tree.canonical(), before);
    }

    #[test]
    fn insert_root_is_refused() {
        let mut tree = sample();
        assert!(tree.insert(&root(), &root(), None).is_none());
    }

    #[test]
    fn remove_returns_subtree() {
        let mut tree = sample();
        let removed = tree.remove(&root(), Path::new("/work/proj/a/b")).unwrap();
        assert_eq!(removed.name(), "b");
        assert!(removed.is_dir());
        assert_eq!(tree.flatten(), vec!["e.txt"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut tree = sample();
        assert!(tree.remove(&root(), Path::new("/work/proj/ghost")).is_none());
        assert!(tree.remove(&root(), &root()).is_none());
        assert_eq!(tree.flatten().len(), 3);
    }
}
