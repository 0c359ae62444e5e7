use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::outline::{Outline, FOLD_MARKER};
use crate::theme::ThemeColors;

/// Sidebar widget listing the visible outline lines.
pub struct OutlineWidget<'a> {
    outline: &'a Outline,
    theme: &'a ThemeColors,
    selected: Option<usize>,
    scroll_offset: usize,
    block: Option<Block<'a>>,
}

impl<'a> OutlineWidget<'a> {
    pub fn new(outline: &'a Outline, theme: &'a ThemeColors) -> Self {
        Self {
            outline,
            theme,
            selected: None,
            scroll_offset: 0,
            block: None,
        }
    }

    /// Highlight outline line `selected`.
    pub fn selected(mut self, selected: Option<usize>) -> Self {
        self.selected = selected;
        self
    }

    pub fn scroll_offset(mut self, offset: usize) -> Self {
        self.scroll_offset = offset;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Disclosure marker in front of a label.
    fn indicator(&self, index: usize) -> &'static str {
        if !self.outline.has_range(index) {
            "  "
        } else if self.outline.is_folded(index) {
            "▸ "
        } else {
            "▾ "
        }
    }
}

impl<'a> Widget for OutlineWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible = self.outline.visible();
        let visible_height = inner_area.height as usize;
        if visible.is_empty() || visible_height == 0 {
            return;
        }

        let rows = visible
            .iter()
            .skip(self.scroll_offset)
            .take(visible_height)
            .enumerate();

        for (row, &index) in rows {
            let Some(line) = self.outline.line(index) else {
                continue;
            };
            let y = inner_area.y + row as u16;

            let style = if Some(index) == self.selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if line.is_dir {
                Style::default()
                    .fg(self.theme.tree_dir_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.tree_file_fg)
            };

            let mut label = format!(
                "{}{}{}",
                "  ".repeat(line.depth),
                self.indicator(index),
                line.label()
            );
            if line.is_dir {
                label.push('/');
            }
            let mut spans = vec![Span::styled(label, style)];
            if line.folded {
                spans.push(Span::styled(
                    FOLD_MARKER,
                    Style::default().fg(self.theme.fold_marker_fg),
                ));
            }

            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
