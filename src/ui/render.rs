use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::app::Model;
use crate::outline::EMPTY_PLACEHOLDER;
use crate::session::Registry;

use super::style::{Theme, style_for_inline, style_for_line_type};
use super::{
    DOC_WIDTH_PERCENT, DOCUMENT_LEFT_PADDING, MAX_TAB_TITLE, OUTLINE_WIDTH_PERCENT,
    STATUS_BAR_HEIGHT, TAB_BAR_HEIGHT, overlays, status,
};

const NO_MATCHES_PLACEHOLDER: &str = "No matching headers";

pub fn split_main_columns(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(OUTLINE_WIDTH_PERCENT),
            Constraint::Percentage(DOC_WIDTH_PERCENT),
        ])
        .split(area)
}

pub fn document_content_width(total_width: u16, outline_visible: bool) -> u16 {
    let area = Rect::new(0, 0, total_width, 1);
    let doc_width = if outline_visible {
        split_main_columns(area)[1].width
    } else {
        total_width
    };
    doc_width.saturating_sub(DOCUMENT_LEFT_PADDING).max(1)
}

/// Rows left for content once the tab bar and status line are drawn.
pub const fn content_height(total_height: u16) -> u16 {
    let rows = total_height.saturating_sub(TAB_BAR_HEIGHT + STATUS_BAR_HEIGHT);
    if rows == 0 { 1 } else { rows }
}

/// Area between the tab bar and the status line.
pub const fn main_area(area: Rect) -> Rect {
    Rect {
        y: area.y + TAB_BAR_HEIGHT,
        height: area.height.saturating_sub(TAB_BAR_HEIGHT + STATUS_BAR_HEIGHT),
        ..area
    }
}

/// Outline panel, including its border, when the outline is shown.
pub fn outline_area(area: Rect) -> Rect {
    split_main_columns(main_area(area))[0]
}

/// One tab in the tab bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabel {
    pub title: String,
    pub modified: bool,
    pub active: bool,
}

impl TabLabel {
    pub fn text(&self) -> String {
        format!(" {}{} ", self.title, if self.modified { "*" } else { "" })
    }

    pub fn width(&self) -> usize {
        self.text().width()
    }
}

/// Labels for every open document in tab order.
pub fn tab_labels(registry: &Registry) -> Vec<TabLabel> {
    let active = registry.active();
    registry
        .iter()
        .enumerate()
        .map(|(idx, document)| TabLabel {
            title: format!(
                "{}:{}",
                idx + 1,
                truncate_title(document.display_name(), MAX_TAB_TITLE)
            ),
            modified: document.is_modified(),
            active: Some(document.id()) == active,
        })
        .collect()
}

/// Index of the tab drawn at `column`.
pub fn tab_at_column(labels: &[TabLabel], column: u16) -> Option<usize> {
    let column = usize::from(column);
    let mut start = 0;
    for (idx, label) in labels.iter().enumerate() {
        let end = start + label.width();
        if column < end {
            return Some(idx);
        }
        start = end;
    }
    None
}

/// The outline row kept in view: the selection while the outline has
/// focus, otherwise the active entry.
pub fn outline_focus_row(model: &Model) -> Option<usize> {
    model
        .outline_has_focus()
        .then_some(model.outline_selected)
        .flatten()
        .or_else(|| model.active_outline_row())
}

/// First outline row drawn so that `focus` stays visible in `rows` rows.
pub fn outline_scroll_start(len: usize, focus: Option<usize>, rows: usize) -> usize {
    if rows == 0 || len <= rows {
        return 0;
    }
    let max_start = len - rows;
    focus
        .map_or(0, |row| row.saturating_sub(rows - 1))
        .min(max_start)
}

fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_string();
    }
    let mut out: String = title.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let theme = Theme::current();

    let tab_area = Rect {
        height: TAB_BAR_HEIGHT.min(area.height),
        ..area
    };
    render_tab_bar(model, frame, tab_area, &theme);

    let main = main_area(area);
    if model.session.outline().is_visible() {
        let chunks = split_main_columns(main);
        render_outline(model, frame, chunks[0], &theme);
        render_content(model, frame, chunks[1]);
    } else {
        render_content(model, frame, main);
    }

    // Prompt and toast cover the last content row so the viewport height
    // never changes under the reader.
    let footer_area = Rect {
        y: main.y + main.height.saturating_sub(1),
        height: 1.min(main.height),
        ..main
    };
    if let Some(prompt) = model.prompt.as_ref() {
        status::render_prompt_bar(prompt, frame, footer_area, &theme);
    } else if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, footer_area);
    }

    let status_area = Rect {
        y: area.y + area.height.saturating_sub(STATUS_BAR_HEIGHT),
        height: STATUS_BAR_HEIGHT.min(area.height),
        ..area
    };
    status::render_status_bar(model, frame, status_area, &theme);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_tab_bar(model: &Model, frame: &mut Frame, area: Rect, theme: &Theme) {
    let labels = tab_labels(model.session.registry());
    let mut spans: Vec<Span> = Vec::with_capacity(labels.len() * 3);
    for label in &labels {
        let style = if label.active {
            theme.tab_active
        } else {
            theme.tab_inactive
        };
        spans.push(Span::styled(format!(" {}", label.title), style));
        if label.modified {
            spans.push(Span::styled("*", style.patch(theme.modified_marker)));
        }
        spans.push(Span::styled(" ", style));
    }
    if labels.is_empty() {
        spans.push(Span::styled(" MKReader ", theme.tab_inactive));
    }
    let bar = Paragraph::new(Line::from(spans)).style(theme.tab_bar);
    frame.render_widget(bar, area);
}

fn render_outline(model: &Model, frame: &mut Frame, area: Rect, theme: &Theme) {
    let outline = model.session.outline();
    let focused = model.outline_has_focus();
    let title = if outline.filter().is_empty() {
        "Outline".to_string()
    } else {
        format!("Outline [{}]", outline.filter())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            theme.outline_border_focused
        } else {
            theme.outline_border
        });

    let entries = outline.visible_entries();
    if entries.is_empty() {
        let placeholder = if outline.is_empty() {
            EMPTY_PLACEHOLDER
        } else {
            NO_MATCHES_PLACEHOLDER
        };
        let paragraph = Paragraph::new(Line::styled(placeholder, theme.placeholder))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = area.height.saturating_sub(2) as usize;
    let start = outline_scroll_start(entries.len(), outline_focus_row(model), rows);
    let items: Vec<Line> = entries
        .iter()
        .enumerate()
        .skip(start)
        .take(rows)
        .map(|(row, (idx, entry))| {
            let active = outline.active() == Some(*idx);
            let selected = focused && model.outline_selected == Some(row);
            let marker = if active { ">" } else { " " };
            let indent = "  ".repeat(entry.depth);
            let mut style = if active {
                theme.outline_active
            } else {
                Style::default()
            };
            if selected {
                style = style.patch(theme.outline_selected);
            }
            Line::styled(format!("{marker} {indent}{}", entry.header.text), style)
        })
        .collect();

    frame.render_widget(Paragraph::new(items).block(block), area);
}

fn render_content(model: &Model, frame: &mut Frame, area: Rect) {
    let surface = model.session.surface();
    let lines = surface.layout().lines();
    let range = surface.viewport().visible_range();

    let content: Vec<Line> = lines
        .get(range)
        .unwrap_or_default()
        .iter()
        .map(|line| {
            let base = style_for_line_type(line.line_type());
            let spans: Vec<Span> = line
                .spans()
                .iter()
                .map(|span| Span::styled(span.text().to_string(), style_for_inline(base, span.style())))
                .collect();
            Line::from(spans)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::NONE)
        .padding(Padding::left(DOCUMENT_LEFT_PADDING));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(title: &str, modified: bool) -> TabLabel {
        TabLabel {
            title: title.to_string(),
            modified,
            active: false,
        }
    }

    #[test]
    fn test_tab_at_column_walks_label_widths() {
        // " 1:a.md " is 8 wide, " 2:b.md* " is 9 wide.
        let labels = vec![label("1:a.md", false), label("2:b.md", true)];
        assert_eq!(tab_at_column(&labels, 0), Some(0));
        assert_eq!(tab_at_column(&labels, 7), Some(0));
        assert_eq!(tab_at_column(&labels, 8), Some(1));
        assert_eq!(tab_at_column(&labels, 16), Some(1));
        assert_eq!(tab_at_column(&labels, 17), None);
        assert_eq!(tab_at_column(&[], 0), None);
    }

    #[test]
    fn test_outline_scroll_keeps_focus_visible() {
        assert_eq!(outline_scroll_start(5, Some(4), 10), 0);
        assert_eq!(outline_scroll_start(30, None, 10), 0);
        assert_eq!(outline_scroll_start(30, Some(9), 10), 0);
        assert_eq!(outline_scroll_start(30, Some(10), 10), 1);
        assert_eq!(outline_scroll_start(30, Some(29), 10), 20);
        assert_eq!(outline_scroll_start(30, Some(5), 0), 0);
    }

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("short.md", 24), "short.md");
        let long = "a-very-long-document-name-indeed.md";
        let truncated = truncate_title(long, 10);
        assert_eq!(truncated.chars().count(), 10);
        assert!(truncated.ends_with('\u{2026}'));
    }

    #[test]
    fn test_content_height_reserves_chrome_rows() {
        assert_eq!(content_height(24), 22);
        assert_eq!(content_height(1), 1);
        let main = main_area(Rect::new(0, 0, 80, 24));
        assert_eq!((main.y, main.height), (1, 22));
    }
}
