//! Map filesystem paths to outline lines.
//!
//! Lookup walks the outline top-down, one logical segment at a time. A
//! compressed line such as `a/b` consumes several segments without moving to
//! a new line.

use std::path::Path;

use super::render::Outline;
use crate::tree::relative_segments;

impl Outline {
    /// Line showing `path`.
    ///
    /// With `exact`, the whole path must resolve. Otherwise the deepest line
    /// reached is returned, which positions on the closest visible ancestor
    /// of a missing entry. The root itself has no line.
    pub fn locate(&self, path: &Path, exact: bool) -> Option<usize> {
        let segments = relative_segments(self.root(), path)?;
        let mut best = None;
        let mut parent = None;
        let mut consumed = 0;

        while consumed < segments.len() {
            let Some(index) = self.child_named(parent, &segments[consumed]) else {
                break;
            };
            best = Some(index);
            let shown = &self.lines()[index].segments;
            let mut offset = 1;
            consumed += 1;
            while offset < shown.len()
                && consumed < segments.len()
                && shown[offset] == segments[consumed]
            {
                offset += 1;
                consumed += 1;
            }
            if offset < shown.len() && consumed < segments.len() {
                // Diverged inside a compressed line.
                break;
            }
            parent = Some(index);
        }

        if consumed == segments.len() || !exact {
            best
        } else {
            None
        }
    }

    /// Direct child line of `parent` (top level when `None`) whose first
    /// segment is `name`.
    fn child_named(&self, parent: Option<usize>, name: &str) -> Option<usize> {
        let lines = self.lines();
        let (start, end) = match parent {
            Some(p) => (p + 1, lines[p].end),
            None => (0, lines.len()),
        };
        let mut index = start;
        while index < end {
            let line = &lines[index];
            if line.segments.first().is_some_and(|s| s == name) {
                return Some(index);
            }
            // Skip to the next sibling.
            index = line.end;
        }
        None
    }

    /// Parent line of `index`, if any.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.line(index).and_then(|line| line.parent)
    }

    /// Folded ancestors hiding `index`, outermost first.
    pub fn folded_ancestors(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cursor = self.parent_of(index);
        while let Some(parent) = cursor {
            if self.is_folded(parent) {
                out.push(parent);
            }
            cursor = self.parent_of(parent);
        }
        out.reverse();
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::outline::{FoldSet, Outline};
    use crate::tree::Tree;
    use std::path::{Path, PathBuf};

    fn outline(records: &[&str], inline_folders: bool) -> Outline {
        let mut tree = Tree::from_paths("proj", records);
        tree.sort();
        Outline::render(&tree, Path::new("/proj"), inline_folders)
    }

    fn sample() -> Outline {
        outline(&["a/b/c.txt", "a/b/d.txt", "e.txt"], true)
    }

    #[test]
    fn locate_files_and_directories() {
        let outline = sample();
        assert_eq!(outline.locate(Path::new("/proj/a/b/d.txt"), true), Some(2));
        assert_eq!(outline.locate(Path::new("/proj/e.txt"), true), Some(3));
        assert_eq!(outline.locate(Path::new("/proj/a/b/"), true), Some(0));
    }

    #[test]
    fn locate_inside_compressed_line() {
        let outline = sample();
        assert_eq!(outline.locate(Path::new("/proj/a"), true), Some(0));
    }

    #[test]
    fn locate_missing_entry() {
        let outline = sample();
        assert_eq!(outline.locate(Path::new("/proj/a/b/zzz.txt"), true), None);
        assert_eq!(outline.locate(Path::new("/proj/a/b/zzz.txt"), false), Some(0));
        assert_eq!(outline.locate(Path::new("/proj/nope"), false), None);
        assert_eq!(outline.locate(Path::new("/elsewhere/a"), false), None);
        assert_eq!(outline.locate(Path::new("/proj"), true), None);
    }

    #[test]
    fn locate_diverging_inside_compressed_line() {
        let outline = sample();
        assert_eq!(outline.locate(Path::new("/proj/a/q/c.txt"), true), None);
        assert_eq!(outline.locate(Path::new("/proj/a/q/c.txt"), false), Some(0));
        assert_eq!(outline.locate(Path::new("/proj/a/new.txt"), true), None);
        assert_eq!(outline.locate(Path::new("/proj/a/new.txt"), false), Some(0));
    }

    #[test]
    fn locate_uncompressed_walks_each_level() {
        let outline = outline(&["a/b/c.txt", "e.txt"], false);
        assert_eq!(outline.locate(Path::new("/proj/a"), true), Some(0));
        assert_eq!(outline.locate(Path::new("/proj/a/b"), true), Some(1));
        assert_eq!(outline.locate(Path::new("/proj/a/b/c.txt"), true), Some(2));
    }

    #[test]
    fn locate_skips_same_named_entries_in_other_branches() {
        let outline = outline(&["x/same.txt", "y/same.txt", "y/other.txt"], true);
        // x, x/same.txt, y, y/other.txt, y/same.txt
        assert_eq!(outline.locate(Path::new("/proj/y/same.txt"), true), Some(4));
    }

    #[test]
    fn locate_ignores_folding() {
        let mut outline = sample();
        outline.fold(0, &FoldSet::new(Path::new("/proj")));
        assert_eq!(outline.locate(Path::new("/proj/a/b/c.txt"), true), Some(1));
        assert_eq!(outline.folded_ancestors(1), vec![0]);
    }

    #[test]
    fn path_at_inverts_locate() {
        let outline = outline(&["a/b/c.txt", "a/b/d/e.txt", "f.txt"], true);
        for index in 0..outline.len() {
            let path = outline.path_at(index).unwrap();
            assert_eq!(outline.locate(&path, true), Some(index));
        }
        assert_eq!(outline.path_at(0).unwrap(), PathBuf::from("/proj/a/b/"));
    }
}
