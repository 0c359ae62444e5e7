//! Indented outline of a tree with foldable directory ranges.
//!
//! Every directory line owns the range of lines holding its descendants.
//! Fold flags live on the lines themselves. Unfolding a directory opens its
//! whole range; folding it again only recreates the descendant folds still
//! recorded in the `FoldSet`.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use super::fold::FoldSet;
use crate::tree::{compress, DisplayNode, Tree};

/// Marker appended to a folded directory line.
pub const FOLD_MARKER: &str = "...";

/// One physical line of the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Indentation in tabs, the nesting depth of the displayed entry.
    pub depth: usize,
    /// Logical names shown on this line; more than one when compressed.
    pub segments: Vec<String>,
    pub is_dir: bool,
    pub parent: Option<usize>,
    /// One past the last descendant line.
    pub end: usize,
    pub folded: bool,
}

impl Line {
    pub fn label(&self) -> String {
        self.segments.join("/")
    }
}

/// Rendered outline for one root.
#[derive(Debug, Clone)]
pub struct Outline {
    root: PathBuf,
    lines: Vec<Line>,
}

impl Outline {
    /// Lay out the sorted `tree`, compressing directory chains when
    /// `inline_folders` is set. Nothing starts folded.
    pub fn render(tree: &Tree, root: &Path, inline_folders: bool) -> Self {
        let mut lines = Vec::new();
        for node in compress(tree, inline_folders) {
            push_line(&mut lines, node, None, 0);
        }
        Self {
            root: root.to_path_buf(),
            lines,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether `index` is a directory whose children occupy at least one line.
    pub fn has_range(&self, index: usize) -> bool {
        self.lines
            .get(index)
            .is_some_and(|line| line.is_dir && line.end > index + 1)
    }

    pub fn is_folded(&self, index: usize) -> bool {
        self.lines.get(index).is_some_and(|line| line.folded)
    }

    /// Indices of lines not hidden by a folded ancestor, top to bottom.
    pub fn visible(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.lines.len());
        let mut index = 0;
        while index < self.lines.len() {
            out.push(index);
            let line = &self.lines[index];
            index = if line.folded { line.end } else { index + 1 };
        }
        out
    }

    pub fn is_visible(&self, index: usize) -> bool {
        let mut cursor = self.lines.get(index).and_then(|line| line.parent);
        while let Some(parent) = cursor {
            if self.lines[parent].folded {
                return false;
            }
            cursor = self.lines[parent].parent;
        }
        index < self.lines.len()
    }

    /// Screen row of a visible line.
    pub fn row_of(&self, index: usize) -> Option<usize> {
        self.visible().iter().position(|&i| i == index)
    }

    /// Fold the range of `index`. Descendant ranges recorded in `folds` are
    /// folded along with it. Returns false when there is nothing to hide.
    pub fn fold(&mut self, index: usize, folds: &FoldSet) -> bool {
        if !self.has_range(index) {
            return false;
        }
        self.lines[index].folded = true;
        for inner in index + 1..self.lines[index].end {
            if self.has_range(inner) && folds.contains(&self.path_of(inner)) {
                self.lines[inner].folded = true;
            }
        }
        true
    }

    /// Show the children of `index` again. Folds nested inside the range
    /// are opened too, matching `FoldSet::remove`.
    pub fn unfold(&mut self, index: usize) -> bool {
        if !self.is_folded(index) {
            return false;
        }
        let end = self.lines[index].end;
        for line in &mut self.lines[index..end] {
            line.folded = false;
        }
        true
    }

    /// Top-level directory lines, in order.
    pub fn top_level_dirs(&self) -> Vec<usize> {
        (0..self.lines.len())
            .filter(|&i| self.lines[i].parent.is_none() && self.has_range(i))
            .collect()
    }

    /// Fold every top-level directory.
    pub fn fold_all(&mut self, folds: &FoldSet) {
        for index in self.top_level_dirs() {
            self.fold(index, folds);
        }
    }

    /// Clear every fold flag.
    pub fn unfold_all(&mut self) {
        for line in &mut self.lines {
            line.folded = false;
        }
    }

    /// Logical segments from the root down to and including `index`.
    pub fn segments_of(&self, index: usize) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            chain.push(i);
            cursor = self.lines[i].parent;
        }
        chain
            .iter()
            .rev()
            .flat_map(|&i| self.lines[i].segments.iter().cloned())
            .collect()
    }

    /// Absolute path of `index` without a trailing separator.
    pub fn path_of(&self, index: usize) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(self.segments_of(index));
        path
    }

    /// Absolute path of the entry on `index`; directories end in a
    /// separator.
    pub fn path_at(&self, index: usize) -> Option<PathBuf> {
        let line = self.lines.get(index)?;
        let path = self.path_of(index);
        if !line.is_dir {
            return Some(path);
        }
        let mut text = path.into_os_string();
        text.push(MAIN_SEPARATOR.to_string());
        Some(PathBuf::from(text))
    }

    /// Re-fold every member of `folds` that resolves to a line of its own.
    /// Members that no longer resolve are dropped from `folds`.
    pub fn restore(&mut self, folds: &mut FoldSet) {
        let mut resolved = Vec::new();
        folds.retain(|member| match self.locate(member, true) {
            Some(index) if self.has_range(index) && self.path_of(index) == member => {
                resolved.push(index);
                true
            }
            _ => {
                log::debug!("dropping fold for {}", member.display());
                false
            }
        });
        for index in resolved {
            self.lines[index].folded = true;
        }
    }

    /// Text of the visible outline, one entry per line.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for index in self.visible() {
            let line = &self.lines[index];
            out.push_str(&"\t".repeat(line.depth));
            out.push_str(&line.label());
            if line.is_dir {
                out.push('/');
            }
            if line.folded && self.has_range(index) {
                out.push_str(FOLD_MARKER);
            }
            out.push('\n');
        }
        out
    }
}

fn push_line(lines: &mut Vec<Line>, node: DisplayNode, parent: Option<usize>, depth: usize) {
    let index = lines.len();
    lines.push(Line {
        depth,
        segments: node.segments,
        is_dir: node.is_dir,
        parent,
        end: index + 1,
        folded: false,
    });
    for child in node.children {
        push_line(lines, child, Some(index), depth + 1);
    }
    lines[index].end = lines.len();
}
