use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::detail::{build_summary, DetailWidget};
use crate::components::dialog::DialogWidget;
use crate::components::outline::OutlineWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::config::Side;

/// Split `area` into (sidebar, detail pane) with the sidebar on `side`.
pub fn sidebar_layout(area: Rect, side: Side, width: u16) -> (Rect, Rect) {
    let width = width.min(area.width);
    let constraints = match side {
        Side::Left => [Constraint::Length(width), Constraint::Fill(1)],
        Side::Right => [Constraint::Fill(1), Constraint::Length(width)],
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);
    match side {
        Side::Left => (chunks[0], chunks[1]),
        Side::Right => (chunks[1], chunks[0]),
    }
}

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let (sidebar, detail) = sidebar_layout(rows[0], app.side, app.width);

    // Borders take two rows.
    app.update_scroll(sidebar.height.saturating_sub(2) as usize);
    let selected = app.selected_line();
    let border = Style::default().fg(app.theme.border_fg);

    let root_name = app
        .explorer
        .root()
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| app.explorer.root().display().to_string());
    let outline_block = Block::default()
        .title(format!(" {} ", root_name))
        .borders(Borders::ALL)
        .border_style(border);
    frame.render_widget(
        OutlineWidget::new(app.explorer.outline(), &app.theme)
            .selected(selected)
            .scroll_offset(app.scroll_offset)
            .block(outline_block),
        sidebar,
    );

    if detail.width > 0 {
        let detail_block = Block::default()
            .title(" Details ")
            .borders(Borders::ALL)
            .border_style(border);
        frame.render_widget(
            DetailWidget::new(&app.explorer, selected, &app.theme).block(detail_block),
            detail,
        );
    }

    app.clear_expired_status();
    let path = app
        .selected_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let summary = build_summary(&app.explorer);
    let mut status = StatusBarWidget::new(&path, &summary, &app.theme);
    if let Some((message, _)) = &app.status_message {
        let is_error = message.starts_with("Build failed");
        status = status.status_message(message, is_error);
    }
    if !app.watcher_active {
        status = status.watcher_status("[watch off]");
    }
    frame.render_widget(status, rows[1]);

    frame.render_widget(DialogWidget::new(&app.mode, &app.dialog_state, &app.theme), area);
}
