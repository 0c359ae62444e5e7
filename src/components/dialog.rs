use std::path::Path;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};
use crate::theme::ThemeColors;

/// Centered modal overlay for the open dialog, if any.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    theme: &'a ThemeColors,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState, theme: &'a ThemeColors) -> Self {
        Self {
            mode,
            dialog_state,
            theme,
        }
    }
}

/// Rectangle of `width` x `height` centered in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + area.width.saturating_sub(w) / 2;
    let y = area.y + area.height.saturating_sub(h) / 2;
    Rect::new(x, y, w, h)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::CreateFile { parent } => {
                let title = format!("New file in {}/", file_name(parent));
                self.render_input(&title, area, buf);
            }
            DialogKind::CreateDirectory { parent } => {
                let title = format!("New directory in {}/", file_name(parent));
                self.render_input(&title, area, buf);
            }
            DialogKind::Rename { original } => {
                let title = format!("Rename {}", file_name(original));
                self.render_input(&title, area, buf);
            }
            DialogKind::CopyTo { source } => {
                let title = format!("Copy {} to", file_name(source));
                self.render_input(&title, area, buf);
            }
            DialogKind::DeleteConfirm { target } => self.render_confirm(target, area, buf),
            DialogKind::Error { message } => self.render_error(message, area, buf),
        }
    }
}

impl<'a> DialogWidget<'a> {
    /// Draw the frame and return the area inside it.
    fn frame(&self, title: &str, rect: Rect, border: Style, buf: &mut Buffer) -> Rect {
        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(border)
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &str, inner: Rect, buf: &mut Buffer) {
        if inner.height > 1 {
            let style = Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM);
            buf.set_line(
                inner.x,
                inner.y + inner.height - 1,
                &Line::from(Span::styled(text, style)),
                inner.width,
            );
        }
    }

    fn render_input(&self, title: &str, area: Rect, buf: &mut Buffer) {
        let rect = centered_rect(50.min(area.width.saturating_sub(4)), 5, area);
        let border = Style::default().fg(self.theme.dialog_border_fg);
        let inner = self.frame(title, rect, border, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let input = &self.dialog_state.input;
        let cursor = self.dialog_state.cursor_position.min(input.len());
        let before = &input[..cursor];
        let mut rest = input[cursor..].chars();
        let under = rest.next().map(String::from).unwrap_or_else(|| " ".into());
        let after: String = rest.collect();

        // Keep the cursor on screen by dropping characters from the left.
        let room = (inner.width as usize).saturating_sub(1);
        let before_len = before.chars().count();
        let before: String = before
            .chars()
            .skip(before_len.saturating_sub(room))
            .collect();

        let text_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.tree_fg)
            .fg(self.theme.status_bg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before, text_style),
            Span::styled(under, cursor_style),
            Span::styled(after, text_style),
        ]);
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

        self.hint("[Enter] Confirm  [Esc] Cancel", inner, buf);
    }

    fn render_confirm(&self, target: &Path, area: Rect, buf: &mut Buffer) {
        let name = file_name(target);
        let width = (name.chars().count() as u16 + 10)
            .max(40)
            .min(area.width.saturating_sub(4));
        let rect = centered_rect(width, 6, area);
        let border = Style::default().fg(self.theme.error_fg);
        let inner = self.frame("Delete", rect, border, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let header = Line::from(Span::styled(
            "Delete permanently?",
            Style::default()
                .fg(self.theme.warning_fg)
                .add_modifier(Modifier::BOLD),
        ));
        buf.set_line(inner.x, inner.y, &header, inner.width);

        let suffix = if target.is_dir() { "/" } else { "" };
        let entry = Line::from(Span::styled(
            format!("  {}{}", name, suffix),
            Style::default().fg(self.theme.tree_fg),
        ));
        if inner.height > 2 {
            buf.set_line(inner.x, inner.y + 1, &entry, inner.width);
        }

        self.hint("[y] Yes  [n/Esc] Cancel", inner, buf);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        let width = (message.chars().count() as u16 + 6)
            .max(30)
            .min(area.width.saturating_sub(4));
        let rect = centered_rect(width, 5, area);
        let border = Style::default().fg(self.theme.error_fg);
        let inner = self.frame("Error", rect, border, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let line = Line::from(Span::styled(
            message,
            Style::default().fg(self.theme.error_fg),
        ));
        buf.set_line(inner.x, inner.y + inner.height / 2, &line, inner.width);

        self.hint("[Enter/Esc] Dismiss", inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use std::path::PathBuf;

    fn render(mode: AppMode, state: DialogState) -> String {
        let tc = theme::dark_theme();
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        DialogWidget::new(&mode, &state, &tc).render(area, &mut buf);
        buffer_to_string(&buf, area)
    }

    fn buffer_to_string(buf: &Buffer, area: Rect) -> String {
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf.cell((x, y)).unwrap().symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_create_file_dialog_names_parent() {
        let content = render(
            AppMode::Dialog(DialogKind::CreateFile {
                parent: PathBuf::from("/tmp/project/src"),
            }),
            DialogState {
                input: "lib.rs".to_string(),
                cursor_position: 6,
            },
        );
        assert!(content.contains("New file in src/"));
        assert!(content.contains("lib.rs"));
    }

    #[test]
    fn test_copy_dialog_renders() {
        let content = render(
            AppMode::Dialog(DialogKind::CopyTo {
                source: PathBuf::from("/tmp/notes.md"),
            }),
            DialogState {
                input: "notes_copy.md".to_string(),
                cursor_position: 0,
            },
        );
        assert!(content.contains("Copy notes.md to"));
        assert!(content.contains("notes_copy.md"));
    }

    #[test]
    fn test_cursor_inside_multibyte_input() {
        let content = render(
            AppMode::Dialog(DialogKind::Rename {
                original: PathBuf::from("/tmp/café.txt"),
            }),
            DialogState {
                input: "café.txt".to_string(),
                cursor_position: 3,
            },
        );
        assert!(content.contains("Rename café.txt"));
        assert!(content.contains("café.txt"));
    }

    #[test]
    fn test_confirm_dialog_renders() {
        let content = render(
            AppMode::Dialog(DialogKind::DeleteConfirm {
                target: PathBuf::from("/tmp/file1.txt"),
            }),
            DialogState::default(),
        );
        assert!(content.contains("Delete permanently?"));
        assert!(content.contains("file1.txt"));
        assert!(content.contains("[y] Yes"));
    }

    #[test]
    fn test_error_dialog_renders() {
        let content = render(
            AppMode::Dialog(DialogKind::Error {
                message: "Permission denied".to_string(),
            }),
            DialogState::default(),
        );
        assert!(content.contains("Error"));
        assert!(content.contains("Permission denied"));
    }

    #[test]
    fn test_no_dialog_mode_noop() {
        let content = render(AppMode::Normal, DialogState::default());
        assert!(content.trim().is_empty());
    }
}
