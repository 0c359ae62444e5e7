use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Bottom bar: path under the cursor, build state and key hints, or a
/// transient status message.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    build_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    watcher_status: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, build_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            build_info,
            theme,
            status_message: None,
            is_error: false,
            watcher_status: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn watcher_status(mut self, status: &'a str) -> Self {
        self.watcher_status = Some(status);
        self
    }
}

const KEY_HINTS: &str = " Tab:fold  a:new  A:dir  r:ren  c:cp  d:del ";

/// Keep the last characters of `text` that fit in `budget` columns,
/// prefixed with `...` when anything was cut.
fn truncate_left(text: &str, budget: usize) -> String {
    let len = text.chars().count();
    if len <= budget {
        return text.to_string();
    }
    if budget <= 3 {
        return text.chars().take(budget).collect();
    }
    let tail: String = text.chars().skip(len - (budget - 3)).collect();
    format!("...{}", tail)
}

fn truncate_right(text: &str, budget: usize) -> String {
    text.chars().take(budget).collect()
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let display = format!("{:<width$}", truncate_right(msg, width), width = width);
            buf.set_line(
                area.x,
                area.y,
                &Line::from(Span::styled(display, style)),
                area.width,
            );
            return;
        }

        // [path] ... [build info] [watcher] [hints]
        let mut right = vec![Span::styled(
            self.build_info.to_string(),
            Style::default().fg(self.theme.info_fg),
        )];
        if let Some(watcher) = self.watcher_status {
            right.push(Span::raw(" "));
            right.push(Span::styled(
                watcher.to_string(),
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if width > KEY_HINTS.len() + self.build_info.len() {
            right.push(Span::styled(
                KEY_HINTS,
                Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::DIM),
            ));
        }
        let right_len: usize = right.iter().map(|s| s.content.chars().count()).sum();

        let path_budget = width.saturating_sub(right_len).saturating_sub(1);
        let path = truncate_left(self.path_str, path_budget);
        let gap = width
            .saturating_sub(path.chars().count())
            .saturating_sub(right_len);

        let mut spans = vec![
            Span::styled(path, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
        ];
        spans.extend(right);
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
