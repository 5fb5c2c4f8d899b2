use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, Prompt, ToastLevel};

use super::style::Theme;

pub fn render_prompt_bar(prompt: &Prompt, frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = format!("{}{}_  Enter: accept  Esc: cancel", prompt.label(), prompt.text);
    let bar = Paragraph::new(text).style(theme.prompt);
    frame.render_widget(bar, area);
}

pub fn status_text(model: &Model) -> String {
    let session = &model.session;
    let outline_indicator = if session.outline().is_visible() {
        " [outline]"
    } else {
        ""
    };
    let busy_indicator = if session.is_busy() { " [rendering]" } else { "" };

    let Some(document) = session.active_document() else {
        return format!(" MKReader  no documents open  o:open{outline_indicator}  ?:help");
    };

    let viewport = session.surface().viewport();
    let position = session
        .registry()
        .position(document.id())
        .map_or(0, |idx| idx + 1);
    let modified = if document.is_modified() { " [+]" } else { "" };
    let watch_indicator = if document.is_watched() {
        " [watching]"
    } else {
        ""
    };
    format!(
        " {}{}  [{}%]  Line {}/{}  Tab {}/{}{}{}{}  ?:help",
        document.display_name(),
        modified,
        viewport.scroll_percent(),
        viewport.offset() + 1,
        viewport.total_lines(),
        position,
        session.registry().len(),
        watch_indicator,
        outline_indicator,
        busy_indicator,
    )
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect, theme: &Theme) {
    let status_bar = Paragraph::new(status_text(model)).style(theme.status);
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
