//! Cooperative, one-directory-per-slot tree builder.
//!
//! `IncrementalBuild` is a plain state machine: every `step` lists exactly
//! one directory, fills the placeholder branch that was reserved for it and
//! queues its subdirectories. Scheduling (the idle gap between steps) and
//! cancellation of the armed slot belong to the owner, see
//! `Explorer::handle_event`.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::{list_dir, root_name, Interesting};
use crate::error::Result;
use crate::tree::{NodeId, Tree};

/// Deferred expansion of one subdirectory into its placeholder branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandTask {
    pub target: NodeId,
    pub dir: PathBuf,
}

/// Outcome of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More directories are queued.
    Pending,
    /// The queue is empty; the next slot completes the build.
    Drained,
}

pub struct IncrementalBuild {
    root: PathBuf,
    tree: Tree,
    queue: VecDeque<ExpandTask>,
    filter: Interesting,
    listed: usize,
}

impl IncrementalBuild {
    /// List the root directory immediately and queue its subdirectories.
    pub fn start(root: &Path, filter: Interesting) -> Result<Self> {
        let entries = list_dir(root, &filter)?;
        let mut build = Self {
            root: root.to_path_buf(),
            tree: Tree::new(root_name(root)),
            queue: VecDeque::new(),
            filter,
            listed: 1,
        };
        let root_id = build.tree.root();
        build.attach(root_id, root, entries);
        log::debug!(
            "incremental build of {} started, {} directories queued",
            root.display(),
            build.queue.len()
        );
        Ok(build)
    }

    /// Fill `target` with `entries`: files directly, subdirectories as
    /// empty placeholders with a queued expansion each.
    fn attach(&mut self, target: NodeId, dir: &Path, entries: Vec<(String, bool)>) {
        for (name, is_dir) in entries {
            if is_dir {
                let path = dir.join(&name);
                let placeholder = self.tree.push_dir(target, name);
                self.queue.push_back(ExpandTask {
                    target: placeholder,
                    dir: path,
                });
            } else {
                self.tree.push_file(target, name);
            }
        }
    }

    /// Run the next queued expansion.
    pub fn step(&mut self) -> Progress {
        if let Some(task) = self.queue.pop_front() {
            match list_dir(&task.dir, &self.filter) {
                Ok(entries) => {
                    self.listed += 1;
                    self.attach(task.target, &task.dir, entries);
                    log::debug!(
                        "listed {} ({} queued)",
                        task.dir.display(),
                        self.queue.len()
                    );
                }
                Err(e) => log::warn!("skipping unreadable directory {}: {}", task.dir.display(), e),
            }
        }
        if self.queue.is_empty() {
            Progress::Drained
        } else {
            Progress::Pending
        }
    }

    pub fn is_drained(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of directory listings performed so far, root included.
    pub fn listed(&self) -> usize {
        self.listed
    }

    /// Complete the build, yielding the sorted tree.
    pub fn finish(mut self) -> Tree {
        self.tree.sort();
        log::info!(
            "incremental build of {} finished after {} listings",
            self.root.display(),
            self.listed
        );
        self.tree
    }

    /// Drop the queued work, keeping whatever was already spliced in.
    pub fn cancel(mut self) -> Tree {
        log::info!(
            "incremental build of {} cancelled with {} directories pending",
            self.root.display(),
            self.queue.len()
        );
        self.queue.clear();
        self.tree.sort();
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::sync;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn two_dirs() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("p").join("inner")).unwrap();
        File::create(dir.path().join("p").join("one.txt")).unwrap();
        fs::create_dir(dir.path().join("q")).unwrap();
        File::create(dir.path().join("q").join("two.txt")).unwrap();
        dir
    }

    fn run_to_end(mut build: IncrementalBuild) -> Tree {
        while build.step() == Progress::Pending {}
        build.finish()
    }

    #[test]
    fn start_lists_only_the_root() {
        let dir = two_dirs();
        let build = IncrementalBuild::start(dir.path(), Interesting::default()).unwrap();
        assert_eq!(build.pending(), 2);
        assert_eq!(build.listed(), 1);
        let tree = &build.tree;
        let p = tree.find_child(tree.root(), "p").unwrap();
        assert!(tree.is_dir(p));
        assert!(tree.children(p).is_empty());
    }

    #[test]
    fn each_step_lists_one_directory() {
        let dir = two_dirs();
        let mut build = IncrementalBuild::start(dir.path(), Interesting::default()).unwrap();
        assert_eq!(build.step(), Progress::Pending);
        assert_eq!(build.listed(), 2);
        // p queued its own child "inner" behind q
        assert_eq!(build.pending(), 2);
        assert_eq!(build.step(), Progress::Pending);
        assert_eq!(build.step(), Progress::Drained);
        assert!(build.is_drained());
        assert_eq!(build.listed(), 4);
    }

    #[test]
    fn finished_tree_matches_synchronous_build() {
        let dir = two_dirs();
        let build = IncrementalBuild::start(dir.path(), Interesting::default()).unwrap();
        let incremental = run_to_end(build);
        let blocking = sync::build(dir.path(), &Interesting::default()).unwrap();
        assert_eq!(incremental, blocking);
        assert_eq!(incremental.flatten(), vec!["p/one.txt", "q/two.txt"]);
    }

    #[test]
    fn cancel_after_first_step_keeps_partial_splice() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("p")).unwrap();
        File::create(dir.path().join("p").join("x.txt")).unwrap();
        fs::create_dir(dir.path().join("q")).unwrap();
        File::create(dir.path().join("q").join("y.txt")).unwrap();

        let mut build = IncrementalBuild::start(dir.path(), Interesting::default()).unwrap();
        assert_eq!(build.pending(), 2);
        build.step();
        assert_eq!(build.pending(), 1);

        let tree = build.cancel();
        let p = tree.find_child(tree.root(), "p").unwrap();
        let q = tree.find_child(tree.root(), "q").unwrap();
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.name(tree.children(p)[0]), "x.txt");
        assert!(tree.is_dir(q));
        assert!(tree.children(q).is_empty());
    }

    #[test]
    fn unreadable_subdirectory_is_skipped() {
        let dir = two_dirs();
        let mut build = IncrementalBuild::start(dir.path(), Interesting::default()).unwrap();
        fs::remove_dir_all(dir.path().join("p")).unwrap();
        while build.step() == Progress::Pending {}
        let tree = build.finish();
        let p = tree.find_child(tree.root(), "p").unwrap();
        assert!(tree.children(p).is_empty());
        assert_eq!(tree.flatten(), vec!["q/two.txt"]);
    }

    #[test]
    fn filter_applies_to_every_level() {
        let dir = two_dirs();
        let filter = Interesting::new(Some("^inner$|^two")).unwrap();
        let build = IncrementalBuild::start(dir.path(), filter).unwrap();
        let tree = run_to_end(build);
        assert_eq!(tree.flatten(), vec!["p/one.txt"]);
        let p = tree.find_child(tree.root(), "p").unwrap();
        assert!(tree.find_child(p, "inner").is_none());
    }

    #[test]
    fn empty_root_is_drained_at_once() {
        let dir = TempDir::new().unwrap();
        let mut build = IncrementalBuild::start(dir.path(), Interesting::default()).unwrap();
        assert!(build.is_drained());
        assert_eq!(build.step(), Progress::Drained);
        assert!(build.finish().flatten().is_empty());
    }
}
