//! Rendering-time compression of directory chains.
//!
//! A directory whose only child is another directory is merged with it into
//! a single `a/b` entry, repeatedly. The canonical `Tree` is never touched;
//! compression produces a separate view that keeps every merged logical
//! segment so navigation can still address each of them.

use super::model::{NodeId, Tree};

/// One line-to-be of the rendered outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNode {
    /// Logical names merged into this entry, outermost first.
    pub segments: Vec<String>,
    /// The deepest node covered by this entry.
    pub id: NodeId,
    pub is_dir: bool,
    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    /// Name as shown on screen, e.g. `a/b`.
    pub fn label(&self) -> String {
        self.segments.join("/")
    }
}

/// Build the display view of the root's children, optionally compressing
/// single-directory chains.
pub fn compress(tree: &Tree, inline_folders: bool) -> Vec<DisplayNode> {
    tree.children(tree.root())
        .iter()
        .map(|&child| display_node(tree, child, inline_folders))
        .collect()
}

fn display_node(tree: &Tree, id: NodeId, inline_folders: bool) -> DisplayNode {
    let mut segments = vec![tree.name(id).to_string()];
    let mut deepest = id;

    if inline_folders && tree.is_dir(id) {
        loop {
            match tree.children(deepest) {
                [only] if tree.is_dir(*only) => {
                    deepest = *only;
                    segments.push(tree.name(deepest).to_string());
                }
                _ => break,
            }
        }
    }

    let children = tree
        .children(deepest)
        .iter()
        .map(|&child| display_node(tree, child, inline_folders))
        .collect();

    DisplayNode {
        segments,
        id: deepest,
        is_dir: tree.is_dir(id),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    /// Reconstruct every file path from a view by re-splitting labels.
    fn expand(nodes: &[DisplayNode], prefix: &str, out: &mut BTreeSet<String>) {
        for node in nodes {
            let path = if prefix.is_empty() {
                node.label()
            } else {
                format!("{}/{}", prefix, node.label())
            };
            if node.is_dir {
                expand(&node.children, &path, out);
            } else {
                out.insert(path.split('/').collect::<Vec<_>>().join("/"));
            }
        }
    }

    fn sorted(records: &[&str]) -> Tree {
        let mut tree = Tree::from_paths("root", records);
        tree.sort();
        tree
    }

    #[test]
    fn chain_is_merged_into_one_entry() {
        let tree = sorted(&["a/b/c.txt", "a/b/d.txt", "e.txt"]);
        let view = compress(&tree, true);
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].label(), "a/b");
        assert_eq!(view[0].segments, vec!["a", "b"]);
        assert_eq!(view[0].children.len(), 2);
        assert_eq!(view[1].label(), "e.txt");
    }

    #[test]
    fn chain_stops_at_a_single_file() {
        let tree = sorted(&["a/only.txt"]);
        let view = compress(&tree, true);
        assert_eq!(view[0].label(), "a");
        assert_eq!(view[0].children[0].label(), "only.txt");
    }

    #[test]
    fn chain_stops_at_a_fork() {
        let tree = sorted(&["a/b/c/x.txt", "a/b/d/y.txt"]);
        let view = compress(&tree, true);
        assert_eq!(view[0].label(), "a/b");
        let labels: Vec<String> = view[0].children.iter().map(|c| c.label()).collect();
        assert_eq!(labels, vec!["c", "d"]);
    }

    #[test]
    fn empty_directory_chain_collapses_fully() {
        let tree = sorted(&["a/b/c/"]);
        let view = compress(&tree, true);
        assert_eq!(view[0].label(), "a/b/c");
        assert!(view[0].children.is_empty());
    }

    #[test]
    fn disabled_compression_mirrors_the_tree() {
        let tree = sorted(&["a/b/c.txt"]);
        let view = compress(&tree, false);
        assert_eq!(view[0].label(), "a");
        assert_eq!(view[0].children[0].label(), "b");
    }

    #[test]
    fn compress_does_not_touch_the_canonical_tree() {
        let tree = sorted(&["a/b/c.txt"]);
        let before = tree.canonical();
        let _ = compress(&tree, true);
        assert_eq!(tree.canonical(), before);
    }

    proptest! {
        #[test]
        fn compression_preserves_file_paths(
            paths in prop::collection::btree_set("[a-c]{1,2}/[a-c]{1,2}/[x-z]{1,2}\\.txt", 1..10)
        ) {
            let records: Vec<&str> = paths.iter().map(String::as_str).collect();
            let tree = sorted(&records);
            let mut recovered = BTreeSet::new();
            expand(&compress(&tree, true), "", &mut recovered);
            prop_assert_eq!(recovered, paths);
        }

        #[test]
        fn compression_is_noop_without_chains(
            files in prop::collection::btree_set("[a-e]{1,3}\\.rs", 1..6)
        ) {
            let records: Vec<&str> = files.iter().map(String::as_str).collect();
            let tree = sorted(&records);
            prop_assert_eq!(compress(&tree, true), compress(&tree, false));
        }
    }
}
