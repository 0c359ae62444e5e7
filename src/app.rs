use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cache::CacheStore;
use crate::config::{AppConfig, Side};
use crate::error::Result;
use crate::event::Event;
use crate::explorer::Explorer;
use crate::fs::operations;
use crate::theme::{self, ThemeColors};

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    CreateFile { parent: PathBuf },
    CreateDirectory { parent: PathBuf },
    Rename { original: PathBuf },
    CopyTo { source: PathBuf },
    DeleteConfirm { target: PathBuf },
    Error { message: String },
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
}

/// State for a dialog's text input.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
}

/// Main application state.
pub struct App {
    pub explorer: Explorer,
    pub cache: CacheStore,
    pub theme: ThemeColors,
    pub side: Side,
    pub width: u16,
    pub confirm_delete: bool,
    /// Path of the entry under the cursor; resolved against the outline on
    /// every use so the cursor survives re-renders.
    pub selected: Option<PathBuf>,
    /// Entry to reveal once the running build delivers its tree.
    pub pending_reveal: Option<PathBuf>,
    pub scroll_offset: usize,
    pub should_quit: bool,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<(String, Instant)>,
    pub watcher_active: bool,
}

impl App {
    /// Wrap an opened explorer session with the sidebar options of `config`.
    pub fn new(explorer: Explorer, cache: CacheStore, config: &AppConfig) -> Self {
        Self {
            explorer,
            cache,
            theme: theme::resolve_theme(config.theme_scheme()),
            side: config.sidebar_side(),
            width: config.sidebar_width(),
            confirm_delete: config.confirm_delete(),
            selected: None,
            pending_reveal: None,
            scroll_offset: 0,
            should_quit: false,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            watcher_active: config.watcher_enabled(),
        }
    }

    // ── Selection ───────────────────────────────────────────────────────

    /// Outline line under the cursor: the selected entry, else its closest
    /// visible ancestor, else the first line.
    pub fn selected_line(&self) -> Option<usize> {
        let outline = self.explorer.outline();
        let mut line = self
            .selected
            .as_deref()
            .and_then(|path| outline.locate(path, false));
        while let Some(index) = line {
            if outline.is_visible(index) {
                break;
            }
            line = outline.line(index).and_then(|l| l.parent);
        }
        line.or_else(|| outline.visible().first().copied())
    }

    /// Position of the cursor among the visible lines.
    pub fn selected_row(&self) -> Option<usize> {
        self.selected_line()
            .and_then(|line| self.explorer.outline().row_of(line))
    }

    /// Absolute path under the cursor (directories end in a separator).
    pub fn selected_path(&self) -> Option<PathBuf> {
        self.selected_line()
            .and_then(|line| self.explorer.outline().path_at(line))
    }

    fn select_line(&mut self, line: usize) {
        self.selected = Some(self.explorer.outline().path_of(line));
    }

    fn select_row(&mut self, row: usize) {
        if let Some(&line) = self.explorer.outline().visible().get(row) {
            self.select_line(line);
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        let len = self.explorer.outline().visible().len();
        if let Some(row) = self.selected_row() {
            if row + 1 < len {
                self.select_row(row + 1);
            }
        }
    }

    /// Move selection up by one item.
    pub fn select_previous(&mut self) {
        if let Some(row) = self.selected_row() {
            self.select_row(row.saturating_sub(1));
        }
    }

    /// Jump to the first item.
    pub fn select_first(&mut self) {
        self.select_row(0);
    }

    /// Jump to the last item.
    pub fn select_last(&mut self) {
        let len = self.explorer.outline().visible().len();
        if len > 0 {
            self.select_row(len - 1);
        }
    }

    /// Jump to the directory containing the selection.
    pub fn select_parent(&mut self) {
        let parent = self
            .selected_line()
            .and_then(|line| self.explorer.outline().parent_of(line));
        if let Some(parent) = parent {
            self.select_line(parent);
        }
    }

    /// Open folded ancestors of `path` and put the cursor on it.
    pub fn reveal(&mut self, path: &Path) {
        if let Some(line) = self.explorer.reveal(path) {
            self.select_line(line);
        }
    }

    /// Reveal `path` now, and again after the running build completes.
    pub fn reveal_when_ready(&mut self, path: PathBuf) {
        self.reveal(&path);
        if self.explorer.is_building() {
            self.pending_reveal = Some(path);
        }
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        let selected = self.selected_row().unwrap_or(0);
        if selected < self.scroll_offset {
            self.scroll_offset = selected;
        } else if selected >= self.scroll_offset + visible_height {
            self.scroll_offset = selected - visible_height + 1;
        }
    }

    // ── Folding ─────────────────────────────────────────────────────────

    /// Toggle the fold of the selected directory. On a file, the enclosing
    /// directory is folded and selected.
    pub fn toggle_fold(&mut self) {
        let Some(line) = self.selected_line() else {
            return;
        };
        if self.explorer.outline().has_range(line) {
            self.explorer.toggle_fold(line);
            return;
        }
        if let Some(parent) = self.explorer.outline().parent_of(line) {
            if self.explorer.fold(parent) {
                self.select_line(parent);
            }
        }
    }

    /// Fold every top-level directory, or unfold everything when folds are
    /// already recorded.
    pub fn cycle_fold_all(&mut self) {
        if self.explorer.folds().is_empty() {
            self.explorer.fold_all();
        } else {
            self.explorer.unfold_all();
        }
    }

    // ── Builds & events ─────────────────────────────────────────────────

    /// Rebuild the tree.
    pub fn refresh(&mut self) {
        match self.explorer.refresh(&mut self.cache) {
            Ok(()) => {
                if self.explorer.is_building() {
                    self.set_status_message("Refreshing...".into());
                }
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// Stop a running build, keeping what it assembled so far.
    pub fn cancel_build(&mut self) {
        if self.explorer.cancel_build() {
            self.set_status_message("Build cancelled".into());
        }
    }

    /// Feed a builder event to the explorer.
    pub fn handle_build_event(&mut self, event: Event) {
        let was_building = self.explorer.is_building();
        if let Err(e) = self.explorer.handle_event(event, &mut self.cache) {
            self.show_error(e.to_string());
            return;
        }
        if was_building && !self.explorer.is_building() {
            if let Some(path) = self.pending_reveal.take() {
                self.reveal(&path);
            }
            match self.explorer.last_failure() {
                Some(failure) => {
                    let message = format!("Build failed: {}", failure);
                    self.set_status_message(message);
                }
                None => self.set_status_message("Tree refreshed".into()),
            }
        }
    }

    /// Reconcile watcher-reported paths into the tree.
    pub fn handle_fs_change(&mut self, paths: Vec<PathBuf>) {
        if !self.watcher_active {
            return;
        }
        if let Err(e) = self.explorer.apply_fs_change(&paths, &mut self.cache) {
            log::warn!("watcher reconciliation failed: {}", e);
        }
    }

    // ── Dialogs ─────────────────────────────────────────────────────────

    /// Open a dialog of the given kind.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        let prefill = match &kind {
            DialogKind::Rename { original } => original.file_name().map(|n| n.to_owned()),
            DialogKind::CopyTo { source } => operations::copy_destination(source)
                .file_name()
                .map(|n| n.to_owned()),
            _ => None,
        };
        if let Some(name) = prefill {
            let name = name.to_string_lossy().to_string();
            self.dialog_state.cursor_position = name.len();
            self.dialog_state.input = name;
        }
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    fn show_error(&mut self, message: String) {
        self.dialog_state = DialogState::default();
        self.mode = AppMode::Dialog(DialogKind::Error { message });
    }

    /// Directory new entries go into: the selected directory, or the one
    /// holding the selected file.
    pub fn current_dir(&self) -> PathBuf {
        let outline = self.explorer.outline();
        match self.selected_line() {
            Some(line) if outline.line(line).is_some_and(|l| l.is_dir) => outline.path_of(line),
            Some(line) => match outline.parent_of(line) {
                Some(parent) => outline.path_of(parent),
                None => self.explorer.root().to_path_buf(),
            },
            None => self.explorer.root().to_path_buf(),
        }
    }

    fn selected_entry(&self) -> Option<PathBuf> {
        self.selected_line()
            .map(|line| self.explorer.outline().path_of(line))
    }

    pub fn begin_create_file(&mut self) {
        let parent = self.current_dir();
        self.open_dialog(DialogKind::CreateFile { parent });
    }

    pub fn begin_create_dir(&mut self) {
        let parent = self.current_dir();
        self.open_dialog(DialogKind::CreateDirectory { parent });
    }

    pub fn begin_rename(&mut self) {
        if let Some(original) = self.selected_entry() {
            self.open_dialog(DialogKind::Rename { original });
        }
    }

    pub fn begin_copy(&mut self) {
        if let Some(source) = self.selected_entry() {
            self.open_dialog(DialogKind::CopyTo { source });
        }
    }

    /// Delete the selection, asking first when `confirm_delete` is set.
    pub fn begin_delete(&mut self) {
        let Some(target) = self.selected_entry() else {
            return;
        };
        if self.confirm_delete {
            self.open_dialog(DialogKind::DeleteConfirm { target });
        } else {
            self.delete(&target);
        }
    }

    /// Apply the open input dialog.
    pub fn confirm_dialog(&mut self) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind.clone(),
            AppMode::Normal => return,
        };
        let name = self.dialog_state.input.trim().to_string();
        if name.is_empty() && !matches!(kind, DialogKind::DeleteConfirm { .. }) {
            if !matches!(kind, DialogKind::Error { .. }) {
                self.set_status_message("Name cannot be empty".into());
            }
            self.close_dialog();
            return;
        }
        self.close_dialog();

        match kind {
            DialogKind::CreateFile { parent } => {
                let path = parent.join(&name);
                let result = self.explorer.create_file(&path, &mut self.cache);
                self.finish_mutation(result, format!("Created {}", name), Some(path));
            }
            DialogKind::CreateDirectory { parent } => {
                let path = parent.join(&name);
                let result = self.explorer.create_dir(&path, &mut self.cache);
                self.finish_mutation(result, format!("Created {}/", name), Some(path));
            }
            DialogKind::Rename { original } => {
                let target = sibling(&original, &name);
                let result = self.explorer.rename(&original, &target, &mut self.cache);
                self.finish_mutation(result, format!("Renamed to {}", name), Some(target));
            }
            DialogKind::CopyTo { source } => {
                let target = sibling(&source, &name);
                let result = self.explorer.copy(&source, &target, &mut self.cache);
                self.finish_mutation(result, format!("Copied to {}", name), Some(target));
            }
            DialogKind::DeleteConfirm { target } => self.delete(&target),
            DialogKind::Error { .. } => {}
        }
    }

    fn delete(&mut self, target: &Path) {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let result = self.explorer.delete(target, &mut self.cache);
        self.finish_mutation(result, format!("Deleted {}", name), None);
    }

    /// Report a mutation; an interrupted build is restarted so the tree
    /// catches up with the filesystem.
    fn finish_mutation(&mut self, result: Result<bool>, done: String, select: Option<PathBuf>) {
        match result {
            Ok(interrupted) => {
                if let Some(path) = select {
                    self.selected = Some(path);
                }
                self.set_status_message(done);
                if interrupted {
                    self.refresh();
                }
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let before = &self.dialog_state.input[..self.dialog_state.cursor_position];
        if let Some(prev) = before.chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        let before = &self.dialog_state.input[..self.dialog_state.cursor_position];
        if let Some(prev) = before.chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        let after = &self.dialog_state.input[self.dialog_state.cursor_position..];
        if let Some(next) = after.chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Status ──────────────────────────────────────────────────────────

    /// Set a status message with current timestamp.
    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, ref created)) = self.status_message {
            if created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

/// `name` next to `path`.
fn sibling(path: &Path, name: &str) -> PathBuf {
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
