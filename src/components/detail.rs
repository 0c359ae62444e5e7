use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::explorer::{BuildStatus, Explorer};
use crate::theme::ThemeColors;

/// One-line summary of the session's build activity.
pub fn build_summary(explorer: &Explorer) -> String {
    let builder = explorer.settings().builder.label();
    match explorer.build_status() {
        BuildStatus::Idle => match explorer.last_failure() {
            Some(_) => format!("{}: failed", builder),
            None => {
                let stats = explorer.tree().stats();
                format!("{} files, {} dirs", stats.files, stats.directories)
            }
        },
        BuildStatus::Listing { listed, pending } => {
            format!("{}: {} listed, {} queued", builder, listed, pending)
        }
        BuildStatus::Running => format!("{}: running", builder),
    }
}

/// Pane describing the entry under the cursor and the session state.
pub struct DetailWidget<'a> {
    explorer: &'a Explorer,
    selected: Option<usize>,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
}

impl<'a> DetailWidget<'a> {
    pub fn new(explorer: &'a Explorer, selected: Option<usize>, theme: &'a ThemeColors) -> Self {
        Self {
            explorer,
            selected,
            theme,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let outline = self.explorer.outline();
        let mut rows = Vec::new();

        if let Some(index) = self.selected {
            if let Some(path) = outline.path_at(index) {
                rows.push(("Path", path.display().to_string()));
            }
            let kind = match outline.line(index) {
                Some(line) if line.is_dir && outline.is_folded(index) => "directory (folded)",
                Some(line) if line.is_dir => "directory",
                _ => "file",
            };
            rows.push(("Kind", kind.to_string()));
        }

        rows.push(("Root", self.explorer.root().display().to_string()));
        rows.push(("Build", build_summary(self.explorer)));
        rows.push(("Folds", self.explorer.folds().len().to_string()));
        if let Some(failure) = self.explorer.last_failure() {
            rows.push(("Error", failure.to_string()));
        }
        rows
    }
}

impl<'a> Widget for DetailWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 {
            return;
        }

        let label_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::BOLD);
        let value_style = Style::default().fg(self.theme.tree_fg);
        let error_style = Style::default().fg(self.theme.error_fg);

        for (row, (label, value)) in self.rows().into_iter().take(inner.height as usize).enumerate() {
            let style = if label == "Error" {
                error_style
            } else {
                value_style
            };
            let line = Line::from(vec![
                Span::styled(format!("{:<6} ", label), label_style),
                Span::styled(value, style),
            ]);
            buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
        }
    }
}
