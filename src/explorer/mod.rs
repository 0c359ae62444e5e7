//! One explorer session: a root directory, its tree, outline and folds,
//! and at most one build in flight.
//!
//! Builds are driven through the shared event channel. The incremental
//! builder arms one idle slot at a time (a sleeping task that posts
//! `Event::BuildStep`); the external builder posts `BuildFinished` or
//! `BuildFailed`. Every build gets a fresh generation so events from a
//! cancelled build are ignored.

pub mod mutation;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::builder::external::ExternalBuild;
use crate::builder::incremental::IncrementalBuild;
use crate::builder::{root_name, sync, BuilderKind, Interesting};
use crate::cache::CacheStore;
use crate::config::{AppConfig, DEFAULT_EXCLUDE};
use crate::error::Result;
use crate::event::Event;
use crate::outline::{FoldSet, Outline};
use crate::tree::Tree;

/// Builder and rendering options for a session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub builder: BuilderKind,
    pub inline_folders: bool,
    pub filter: Interesting,
    pub idle_delay: Duration,
    pub list_command: String,
    pub cache_enabled: bool,
    pub auto_refresh: bool,
}

impl Settings {
    /// Settings from the merged configuration. An invalid exclusion pattern
    /// falls back to the default one.
    pub fn from_config(config: &AppConfig) -> Self {
        let filter = Interesting::new(config.exclude()).unwrap_or_else(|e| {
            log::warn!("invalid exclude pattern, using default: {}", e);
            Interesting::new(Some(DEFAULT_EXCLUDE)).unwrap_or_default()
        });
        Self {
            builder: config.builder(),
            inline_folders: config.inline_folders(),
            filter,
            idle_delay: Duration::from_millis(config.idle_delay_ms()),
            list_command: config.list_command().to_string(),
            cache_enabled: config.cache_enabled(),
            auto_refresh: config.auto_refresh(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Build in flight, if any.
enum BuildState {
    Idle,
    Incremental {
        build: IncrementalBuild,
        slot: Option<JoinHandle<()>>,
    },
    External(ExternalBuild),
}

/// Snapshot of the session's build activity for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Idle,
    /// Incremental build: directories listed so far and still queued.
    Listing { listed: usize, pending: usize },
    /// External listing process running.
    Running,
}

pub struct Explorer {
    root: PathBuf,
    settings: Settings,
    tree: Tree,
    outline: Outline,
    folds: FoldSet,
    build: BuildState,
    generation: u64,
    last_failure: Option<String>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl Explorer {
    /// Session for `root` with an empty tree; call `open` or `refresh` to
    /// populate it.
    pub fn new(root: &Path, settings: Settings, event_tx: mpsc::UnboundedSender<Event>) -> Self {
        let tree = Tree::new(root_name(root));
        let outline = Outline::render(&tree, root, settings.inline_folders);
        Self {
            root: root.to_path_buf(),
            settings,
            tree,
            outline,
            folds: FoldSet::new(root),
            build: BuildState::Idle,
            generation: 0,
            last_failure: None,
            event_tx,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn folds(&self) -> &FoldSet {
        &self.folds
    }

    /// Rendered text of the visible outline.
    pub fn text(&self) -> String {
        self.outline.text()
    }

    /// Message of the most recent abandoned build.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    /// Switch to `root`: folds are forgotten, the cached tree is shown when
    /// available, otherwise a build starts.
    pub fn open(&mut self, root: &Path, cache: &mut CacheStore) -> Result<()> {
        self.cancel_silently();
        self.root = root.to_path_buf();
        self.folds = FoldSet::new(root);
        self.tree = Tree::new(root_name(root));
        self.last_failure = None;
        self.render();

        let cached = if self.settings.cache_enabled {
            cache.load(root)
        } else {
            None
        };
        match cached {
            Some(tree) => {
                log::info!("showing cached tree for {}", root.display());
                self.tree = tree;
                self.render();
                if self.settings.builder.is_async() && self.settings.auto_refresh {
                    self.refresh(cache)?;
                }
                Ok(())
            }
            None => self.refresh(cache),
        }
    }

    /// Rebuild the tree with the configured builder. A running build is
    /// cancelled first.
    pub fn refresh(&mut self, cache: &mut CacheStore) -> Result<()> {
        self.cancel_silently();
        self.last_failure = None;
        self.generation += 1;
        let filter = self.settings.filter.clone();

        match self.settings.builder {
            BuilderKind::Synchronous => {
                let tree = sync::build(&self.root, &filter)?;
                self.set_tree(tree, cache);
            }
            BuilderKind::Incremental => {
                let build = IncrementalBuild::start(&self.root, filter)?;
                let slot = Some(self.arm_slot());
                self.build = BuildState::Incremental { build, slot };
            }
            BuilderKind::External => {
                self.build = BuildState::External(ExternalBuild::spawn(
                    self.root.clone(),
                    self.settings.list_command.clone(),
                    filter,
                    self.generation,
                    self.event_tx.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Schedule the next incremental step after the idle gap.
    fn arm_slot(&self) -> JoinHandle<()> {
        let tx = self.event_tx.clone();
        let generation = self.generation;
        let delay = self.settings.idle_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Event::BuildStep { generation });
        })
    }

    pub fn is_building(&self) -> bool {
        !matches!(self.build, BuildState::Idle)
    }

    pub fn build_status(&self) -> BuildStatus {
        match &self.build {
            BuildState::Idle => BuildStatus::Idle,
            BuildState::Incremental { build, .. } => BuildStatus::Listing {
                listed: build.listed(),
                pending: build.pending(),
            },
            BuildState::External(_) => BuildStatus::Running,
        }
    }

    /// Stop the running build. An incremental build leaves whatever it
    /// already assembled in place. Returns whether a build was running.
    pub fn cancel_build(&mut self) -> bool {
        match self.take_build() {
            Some(Some(partial)) => {
                self.tree = partial;
                self.render();
                true
            }
            Some(None) => true,
            None => false,
        }
    }

    /// Stop the running build and discard its partial result.
    fn cancel_silently(&mut self) -> bool {
        self.take_build().is_some()
    }

    /// Tear down the build state. `Some(partial)` carries the partial tree of
    /// an incremental build.
    fn take_build(&mut self) -> Option<Option<Tree>> {
        let state = std::mem::replace(&mut self.build, BuildState::Idle);
        let outcome = match state {
            BuildState::Idle => return None,
            BuildState::Incremental { build, slot } => {
                if let Some(slot) = slot {
                    slot.abort();
                }
                Some(build.cancel())
            }
            BuildState::External(external) => {
                external.cancel();
                log::info!("external build of {} cancelled", self.root.display());
                None
            }
        };
        // Events already queued by the cancelled build must stay inert.
        self.generation += 1;
        Some(outcome)
    }

    /// React to a builder event. Events of other kinds and events from
    /// superseded builds are ignored.
    pub fn handle_event(&mut self, event: Event, cache: &mut CacheStore) -> Result<()> {
        match event {
            Event::BuildStep { generation } if generation == self.generation => {
                self.step(cache);
            }
            Event::BuildFinished { generation, tree } if generation == self.generation => {
                if matches!(self.build, BuildState::External(_)) {
                    self.build = BuildState::Idle;
                    self.set_tree(tree, cache);
                }
            }
            Event::BuildFailed {
                generation,
                message,
            } if generation == self.generation => {
                if matches!(self.build, BuildState::External(_)) {
                    self.build = BuildState::Idle;
                    self.last_failure = Some(message);
                }
            }
            Event::BuildStep { generation }
            | Event::BuildFinished { generation, .. }
            | Event::BuildFailed { generation, .. } => {
                log::debug!(
                    "ignoring event of superseded build {} (current {})",
                    generation,
                    self.generation
                );
            }
            _ => {}
        }
        Ok(())
    }

    /// Run one armed slot: list the next directory, or complete the build
    /// once the queue has drained.
    fn step(&mut self, cache: &mut CacheStore) {
        let drained = match &mut self.build {
            BuildState::Incremental { build, slot } => {
                *slot = None;
                if build.is_drained() {
                    true
                } else {
                    build.step();
                    false
                }
            }
            _ => return,
        };

        if drained {
            if let BuildState::Incremental { build, .. } =
                std::mem::replace(&mut self.build, BuildState::Idle)
            {
                self.set_tree(build.finish(), cache);
            }
        } else {
            let next = self.arm_slot();
            if let BuildState::Incremental { slot, .. } = &mut self.build {
                *slot = Some(next);
            }
        }
    }

    /// Install a complete tree: sort, cache, render and restore folds.
    fn set_tree(&mut self, mut tree: Tree, cache: &mut CacheStore) {
        tree.sort();
        self.tree = tree;
        self.save(cache);
        self.render();
    }

    fn save(&self, cache: &mut CacheStore) {
        if !self.settings.cache_enabled {
            return;
        }
        if let Err(e) = cache.save(&self.root, &self.tree) {
            log::warn!("could not cache tree for {}: {}", self.root.display(), e);
        }
    }

    fn render(&mut self) {
        self.outline = Outline::render(&self.tree, &self.root, self.settings.inline_folders);
        self.outline.restore(&mut self.folds);
    }

    // ── Folding ─────────────────────────────────────────────────────────

    /// Fold the directory on `line`. Returns false when it has no children.
    pub fn fold(&mut self, line: usize) -> bool {
        if !self.outline.fold(line, &self.folds) {
            return false;
        }
        self.folds.add(&self.outline.path_of(line));
        true
    }

    pub fn unfold(&mut self, line: usize) -> bool {
        if !self.outline.unfold(line) {
            return false;
        }
        self.folds.remove(&self.outline.path_of(line));
        true
    }

    pub fn toggle_fold(&mut self, line: usize) -> bool {
        if self.outline.is_folded(line) {
            self.unfold(line)
        } else {
            self.fold(line)
        }
    }

    /// Fold every top-level directory.
    pub fn fold_all(&mut self) {
        self.outline.fold_all(&self.folds);
        for line in self.outline.top_level_dirs() {
            self.folds.add(&self.outline.path_of(line));
        }
    }

    /// Unfold everything and forget every recorded fold.
    pub fn unfold_all(&mut self) {
        self.outline.unfold_all();
        self.folds.clear();
    }

    /// Line showing `path`, or its closest ancestor, with every folded
    /// ancestor opened.
    pub fn reveal(&mut self, path: &Path) -> Option<usize> {
        let line = self.outline.locate(path, false)?;
        for ancestor in self.outline.folded_ancestors(line) {
            self.unfold(ancestor);
        }
        Some(line)
    }
}
