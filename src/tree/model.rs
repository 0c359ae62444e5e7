//! Canonical tree model.
//!
//! A `Tree` is an arena of nodes addressed by `NodeId`. The root is always
//! slot 0 and is named after the root directory's base name; its ancestry is
//! implicit. A directory node holds the ids of its children in display order
//! once `sort` has run. Detached nodes stay in the arena as unreachable slots
//! and are dropped on the next round trip through `Entry`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Index of a node inside a `Tree` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Shape of a node: a file leaf or a directory branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory(Vec<NodeId>),
}

/// A single arena slot.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    /// Children of a directory; always empty for files.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory(children) => children,
            NodeKind::File => &[],
        }
    }
}

/// Owned, nested form of a subtree.
///
/// Used to carry subtrees between trees (rename/copy) and as the on-disk
/// cache format. Serializes as nested lists: a file is `"name"`, a directory
/// is `["name", [children...]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    File(String),
    Directory(String, Vec<Entry>),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::File(name) | Entry::Directory(name, _) => name,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Directory(..))
    }

    /// Re-label the entry, keeping its contents.
    pub fn renamed(self, name: impl Into<String>) -> Entry {
        match self {
            Entry::File(_) => Entry::File(name.into()),
            Entry::Directory(_, children) => Entry::Directory(name.into(), children),
        }
    }

    /// Recursively sorted copy: directories first, then by name.
    pub fn sorted(self) -> Entry {
        match self {
            Entry::File(name) => Entry::File(name),
            Entry::Directory(name, children) => {
                let mut children: Vec<Entry> = children.into_iter().map(Entry::sorted).collect();
                children.sort_by(|a, b| display_order(a.is_dir(), a.name(), b.is_dir(), b.name()));
                Entry::Directory(name, children)
            }
        }
    }
}

/// Sibling order: all directories before all files, then plain string order.
pub fn display_order(a_dir: bool, a_name: &str, b_dir: bool, b_name: &str) -> Ordering {
    b_dir.cmp(&a_dir).then_with(|| a_name.cmp(b_name))
}

/// Node counts for a tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    pub files: usize,
    pub directories: usize,
}

/// Arena-backed directory tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree holding only an empty root directory.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name.into(),
                kind: NodeKind::Directory(Vec::new()),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn is_dir(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_dir()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes[id.0].children()
    }

    /// Find the child of `parent` called `name`.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.nodes[child.0].name == name)
    }

    /// Attach a new file leaf under `parent`.
    pub fn push_file(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.push(
            parent,
            Node {
                name: name.into(),
                kind: NodeKind::File,
            },
        )
    }

    /// Attach a new, empty directory branch under `parent`.
    pub fn push_dir(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.push(
            parent,
            Node {
                name: name.into(),
                kind: NodeKind::Directory(Vec::new()),
            },
        )
    }

    /// Attach `node` under `parent`. A sibling with the same name is
    /// overwritten in place so names stay unique within a branch.
    fn push(&mut self, parent: NodeId, node: Node) -> NodeId {
        if let Some(existing) = self.find_child(parent, &node.name) {
            self.nodes[existing.0] = node;
            return existing;
        }
        let id = NodeId(self.nodes.len());
        match self.children_mut(parent) {
            Some(children) => children.push(id),
            None => {
                log::warn!(
                    "cannot attach {:?} under file node {:?}",
                    node.name,
                    self.nodes[parent.0].name
                );
                return parent;
            }
        }
        self.nodes.push(node);
        id
    }

    fn children_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Directory(children) => Some(children),
            NodeKind::File => None,
        }
    }

    /// Unlink the child called `name` from `parent`.
    pub(crate) fn detach(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        let child = self.find_child(parent, name)?;
        let children = self.children_mut(parent)?;
        children.retain(|&c| c != child);
        Some(child)
    }

    /// Attach an owned subtree under `parent`.
    pub fn graft(&mut self, parent: NodeId, entry: Entry) -> NodeId {
        match entry {
            Entry::File(name) => self.push_file(parent, name),
            Entry::Directory(name, children) => {
                let id = self.push_dir(parent, name);
                for child in children {
                    self.graft(id, child);
                }
                id
            }
        }
    }

    /// Owned copy of the subtree rooted at `id`.
    pub fn entry(&self, id: NodeId) -> Entry {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::File => Entry::File(node.name.clone()),
            NodeKind::Directory(children) => Entry::Directory(
                node.name.clone(),
                children.iter().map(|&c| self.entry(c)).collect(),
            ),
        }
    }

    /// Rebuild a tree from its nested form. A bare file entry becomes an
    /// empty root of that name.
    pub fn from_entry(entry: Entry) -> Self {
        match entry {
            Entry::File(name) => Tree::new(name),
            Entry::Directory(name, children) => {
                let mut tree = Tree::new(name);
                let root = tree.root();
                for child in children {
                    tree.graft(root, child);
                }
                tree
            }
        }
    }

    /// Build a tree from newline-style path records relative to the root.
    ///
    /// A record ending in `/` denotes a directory. Intermediate directories
    /// are created on demand, so records may arrive in any order.
    pub fn from_paths<I, S>(root_name: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Tree::new(root_name);
        for record in records {
            tree.accumulate(record.as_ref());
        }
        tree
    }

    fn accumulate(&mut self, record: &str) {
        let record = record.trim_end_matches('\r');
        let record = record.strip_prefix("./").unwrap_or(record);
        let is_dir = record.ends_with('/');
        let segments: Vec<&str> = record
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut cursor = self.root();
        for segment in parents {
            cursor = match self.find_child(cursor, segment) {
                Some(child) if self.is_dir(child) => child,
                _ => self.push_dir(cursor, *segment),
            };
        }

        match self.find_child(cursor, last) {
            Some(existing) if self.is_dir(existing) == is_dir => {}
            _ if is_dir => {
                self.push_dir(cursor, *last);
            }
            _ => {
                self.push_file(cursor, *last);
            }
        }
    }

    /// Sort every branch: directories first, then by name.
    pub fn sort(&mut self) {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            self.sort_children(id);
            stack.extend(
                self.children(id)
                    .iter()
                    .copied()
                    .filter(|&child| self.is_dir(child)),
            );
        }
    }

    /// Sort the immediate children of one branch.
    pub fn sort_children(&mut self, id: NodeId) {
        let Some(mut children) = self.children_mut(id).map(std::mem::take) else {
            return;
        };
        children.sort_by(|&a, &b| {
            let (a, b) = (&self.nodes[a.0], &self.nodes[b.0]);
            display_order(a.is_dir(), &a.name, b.is_dir(), &b.name)
        });
        if let Some(slot) = self.children_mut(id) {
            *slot = children;
        }
    }

    /// Pre-order list of every file's path relative to the root.
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_files(self.root(), "", &mut out);
        out
    }

    fn collect_files(&self, id: NodeId, prefix: &str, out: &mut Vec<String>) {
        for &child in self.children(id) {
            let node = &self.nodes[child.0];
            let path = if prefix.is_empty() {
                node.name.clone()
            } else {
                format!("{}/{}", prefix, node.name)
            };
            if node.is_dir() {
                self.collect_files(child, &path, out);
            } else {
                out.push(path);
            }
        }
    }

    /// Count files and directories reachable from the root (root excluded).
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let mut stack: Vec<NodeId> = self.children(self.root()).to_vec();
        while let Some(id) = stack.pop() {
            if self.is_dir(id) {
                stats.directories += 1;
                stack.extend_from_slice(self.children(id));
            } else {
                stats.files += 1;
            }
        }
        stats
    }

    /// Drop arena slots no longer reachable from the root. Overwritten and
    /// detached subtrees leave such slots behind.
    pub fn compact(&mut self) {
        let stats = self.stats();
        let reachable = stats.files + stats.directories + 1;
        if reachable < self.nodes.len() {
            *self = Tree::from_entry(self.entry(self.root()));
        }
    }

    /// Sorted nested form, used for structural comparison and caching.
    pub fn canonical(&self) -> Entry {
        self.entry(self.root()).sorted()
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Tree {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn sample() -> Tree {
        Tree::from_paths("proj", ["a/b/c.txt", "a/b/d.txt", "e.txt"])
    }

    fn names(tree: &Tree, id: NodeId) -> Vec<&str> {
        tree.children(id).iter().map(|&c| tree.name(c)).collect()
    }

    #[test]
    fn new_tree_has_empty_root() {
        let tree = Tree::new("proj");
        assert_eq!(tree.name(tree.root()), "proj");
        assert!(tree.is_dir(tree.root()));
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn from_paths_creates_intermediate_directories() {
        let tree = sample();
        let a = tree.find_child(tree.root(), "a").unwrap();
        assert!(tree.is_dir(a));
        let b = tree.find_child(a, "b").unwrap();
        assert!(tree.is_dir(b));
        assert_eq!(tree.children(b).len(), 2);
    }

    #[test]
    fn from_paths_trailing_slash_is_directory() {
        let tree = Tree::from_paths("proj", ["empty/", "./file.rs"]);
        let empty = tree.find_child(tree.root(), "empty").unwrap();
        assert!(tree.is_dir(empty));
        assert!(tree.children(empty).is_empty());
        let file = tree.find_child(tree.root(), "file.rs").unwrap();
        assert!(!tree.is_dir(file));
    }

    #[test]
    fn from_paths_ignores_blank_records() {
        let tree = Tree::from_paths("proj", ["", ".", "./", "x"]);
        assert_eq!(names(&tree, tree.root()), vec!["x"]);
    }

    #[test]
    fn duplicate_records_keep_names_unique() {
        let tree = Tree::from_paths("proj", ["src/", "src/main.rs", "src/", "src/main.rs"]);
        let src = tree.find_child(tree.root(), "src").unwrap();
        assert_eq!(tree.children(tree.root()).len(), 1);
        assert_eq!(names(&tree, src), vec!["main.rs"]);
    }

    #[test]
    fn compact_reclaims_detached_and_overwritten_slots() {
        let mut tree = sample();
        let before = tree.canonical();
        let root = tree.root();
        for _ in 0..5 {
            let a = tree.detach(root, "a").unwrap();
            let entry = tree.entry(a);
            tree.graft(root, entry);
            tree.push_file(root, "e.txt");
        }
        assert!(tree.nodes.len() > 6);

        tree.compact();
        // proj, a, b, c.txt, d.txt, e.txt
        assert_eq!(tree.nodes.len(), 6);
        assert_eq!(tree.canonical(), before);
    }

    #[test]
    fn sort_puts_directories_first() {
        let mut tree = Tree::from_paths("proj", ["zeta.txt", "beta/", "alpha.txt", "gamma/x"]);
        tree.sort();
        assert_eq!(
            names(&tree, tree.root()),
            vec!["beta", "gamma", "alpha.txt", "zeta.txt"]
        );
    }

    #[test]
    fn sort_uses_plain_string_order() {
        let mut tree = Tree::from_paths("proj", ["b.txt", "B.txt", "a.txt"]);
        tree.sort();
        assert_eq!(names(&tree, tree.root()), vec!["B.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn flatten_lists_files_in_preorder() {
        let mut tree = sample();
        tree.sort();
        assert_eq!(tree.flatten(), vec!["a/b/c.txt", "a/b/d.txt", "e.txt"]);
    }

    #[test]
    fn entry_round_trip_preserves_structure() {
        let tree = sample();
        let rebuilt = Tree::from_entry(tree.entry(tree.root()));
        assert_eq!(tree, rebuilt);
    }

    #[test]
    fn entry_serializes_as_nested_lists() {
        let entry = Entry::Directory(
            "proj".into(),
            vec![
                Entry::Directory("src".into(), vec![Entry::File("main.rs".into())]),
                Entry::File("README.md".into()),
            ],
        );
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"["proj",[["src",["main.rs"]],"README.md"]]"#);
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn detach_unlinks_child() {
        let mut tree = sample();
        let root = tree.root();
        let removed = tree.detach(root, "e.txt");
        assert!(removed.is_some());
        assert!(tree.find_child(root, "e.txt").is_none());
        assert!(tree.detach(root, "e.txt").is_none());
    }

    #[test]
    fn graft_relabelled_entry() {
        let mut tree = sample();
        let a = tree.find_child(tree.root(), "a").unwrap();
        let b = tree.find_child(a, "b").unwrap();
        let moved = tree.entry(b).renamed("renamed");
        let root = tree.root();
        tree.graft(root, moved);
        tree.sort();
        assert!(tree.flatten().contains(&"renamed/c.txt".to_string()));
    }

    #[test]
    fn stats_count_reachable_nodes() {
        let mut tree = sample();
        let root = tree.root();
        tree.detach(root, "e.txt");
        assert_eq!(
            tree.stats(),
            TreeStats {
                files: 2,
                directories: 2
            }
        );
    }

    #[test]
    fn pushing_under_a_file_is_refused() {
        let mut tree = sample();
        let file = tree.find_child(tree.root(), "e.txt").unwrap();
        tree.push_file(file, "inner");
        assert!(tree.children(file).is_empty());
    }

    fn path_sets() -> impl Strategy<Value = BTreeSet<String>> {
        let segment = "[a-e]{1,2}";
        let path = prop::collection::vec(segment, 1..4).prop_map(|segs| segs.join("/"));
        prop::collection::btree_set(path, 1..12).prop_map(|paths| {
            // A name cannot be both a file and a directory.
            let dirs: BTreeSet<String> = paths
                .iter()
                .flat_map(|p| {
                    let parts: Vec<&str> = p.split('/').collect();
                    (1..parts.len())
                        .map(|i| parts[..i].join("/"))
                        .collect::<Vec<_>>()
                })
                .collect();
            paths.into_iter().filter(|p| !dirs.contains(p)).collect()
        })
    }

    proptest! {
        #[test]
        fn flatten_returns_each_path_once(paths in path_sets(), reverse in any::<bool>()) {
            let mut records: Vec<&String> = paths.iter().collect();
            if reverse {
                records.reverse();
            }
            let tree = Tree::from_paths("root", records);
            let flat = tree.flatten();
            let as_set: BTreeSet<String> = flat.iter().cloned().collect();
            prop_assert_eq!(flat.len(), as_set.len());
            prop_assert_eq!(as_set, paths);
        }

        #[test]
        fn sort_is_idempotent(paths in path_sets()) {
            let mut once = Tree::from_paths("root", &paths);
            once.sort();
            let first = once.entry(once.root());
            once.sort();
            prop_assert_eq!(first, once.entry(once.root()));
        }

        #[test]
        fn sorted_siblings_are_ordered(paths in path_sets()) {
            let mut tree = Tree::from_paths("root", &paths);
            tree.sort();
            let mut stack = vec![tree.root()];
            while let Some(id) = stack.pop() {
                let kids = tree.children(id);
                for pair in kids.windows(2) {
                    let (a, b) = (&tree.nodes[pair[0].0], &tree.nodes[pair[1].0]);
                    prop_assert_ne!(
                        display_order(a.is_dir(), &a.name, b.is_dir(), &b.name),
                        Ordering::Greater
                    );
                }
                stack.extend(kids.iter().copied().filter(|&k| tree.is_dir(k)));
            }
        }
    }
}
