use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;

const KEYS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k or Up/Down", "Scroll"),
            ("Space/PageDown", "Page down"),
            ("b/PageUp", "Page up"),
            ("Ctrl-d / Ctrl-u", "Half page"),
            ("g / G", "Top / bottom"),
        ],
    ),
    (
        "Tabs",
        &[
            ("o / Ctrl-o / Ctrl-t", "Open a file"),
            ("x / Ctrl-w", "Close tab"),
            ("] / Ctrl-Tab", "Next tab"),
            ("[ / Shift-Tab", "Previous tab"),
            ("1-9 / Alt-1..9", "Jump to tab"),
            ("Click a tab", "Switch to it"),
        ],
    ),
    (
        "Outline",
        &[
            ("t / Ctrl-\\", "Show / hide"),
            ("Tab", "Switch focus"),
            ("j/k, Enter", "Select and jump"),
            ("/", "Filter headers"),
            ("Esc", "Clear filter"),
        ],
    ),
    (
        "Other",
        &[
            ("Ctrl-e", "Export to HTML"),
            ("q / Ctrl-c / Ctrl-q", "Quit"),
            ("? / F1", "Toggle help"),
        ],
    ),
];

pub fn help_lines(model: &Model) -> Vec<Line<'static>> {
    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    for (section, keys) in KEYS {
        lines.push(Line::styled(*section, section_style));
        for (key, action) in *keys {
            lines.push(Line::raw(format!("  {key:<22}{action}")));
        }
        lines.push(Line::raw(""));
    }

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());
    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));
    lines
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    // Inner area: border(1) + padding(1) on each side = 4
    let inner = Rect::new(
        popup.x + 2,
        popup.y + 2,
        popup.width.saturating_sub(4),
        popup.height.saturating_sub(4),
    );

    // Reserve 1 row at bottom for footer hint
    let content_height = inner.height.saturating_sub(1);
    let lines = help_lines(model);
    let visible: Vec<Line> = lines.into_iter().take(content_height as usize).collect();
    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height);
    frame.render_widget(Paragraph::new(visible), content_area);

    let footer_area = Rect::new(inner.x, inner.y + content_height, inner.width, 1);
    let footer = Line::styled("any key closes", Style::default().fg(Color::Indexed(245)));
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
