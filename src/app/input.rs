use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::export::ExportFormat;
use crate::session::Command;

use super::event_loop::ResizeDebouncer;

const WHEEL_LINES: usize = 3;

impl App {
    pub(super) fn handle_event(
        &self,
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return Some(Message::HideHelp);
        }

        if let Some(prompt) = model.prompt.as_ref() {
            return match key.code {
                KeyCode::Esc => Some(Message::PromptCancel),
                KeyCode::Enter => Some(Message::PromptSubmit),
                KeyCode::Backspace => {
                    let mut next = prompt.text.clone();
                    next.pop();
                    Some(Message::PromptInput(next))
                }
                KeyCode::Char(c)
                    if !key.modifiers.contains(KeyModifiers::CONTROL)
                        && !key.modifiers.contains(KeyModifiers::ALT) =>
                {
                    let mut next = prompt.text.clone();
                    next.push(c);
                    Some(Message::PromptInput(next))
                }
                _ => None,
            };
        }

        if let Some(msg) = Self::handle_tab_key(key) {
            return Some(msg);
        }

        if model.outline_has_focus() {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Some(Message::OutlineDown),
                KeyCode::Char('k') | KeyCode::Up => Some(Message::OutlineUp),
                KeyCode::Enter | KeyCode::Char(' ') => Some(Message::OutlineSelect),
                KeyCode::Char('/') => Some(Message::StartFilter),
                KeyCode::Esc if !model.session.outline().filter().is_empty() => {
                    Some(Message::ClearFilter)
                }
                KeyCode::Tab | KeyCode::Esc => Some(Message::SwitchFocus),
                KeyCode::Char('t') => Some(Message::Session(Command::ToggleOutline)),
                KeyCode::Char('?') | KeyCode::F(1) => Some(Message::ToggleHelp),
                KeyCode::Char('q') => Some(Message::Quit),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Message::ScrollDown(1)),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::ScrollUp(1)),
            KeyCode::Char(' ') | KeyCode::PageDown => Some(Message::PageDown),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::GoToBottom),
            KeyCode::Tab if model.session.outline().is_visible() => Some(Message::SwitchFocus),
            KeyCode::Tab | KeyCode::Char(']') => Some(Message::Session(Command::Next)),
            KeyCode::Char('[') => Some(Message::Session(Command::Previous)),
            KeyCode::Char(c @ '1'..='9') => Some(jump_to_digit(c)),
            KeyCode::Char('t') => Some(Message::Session(Command::ToggleOutline)),
            KeyCode::Char('/') => Some(Message::StartFilter),
            KeyCode::Char('o') => Some(Message::StartOpen),
            KeyCode::Char('x') => Some(Message::Session(Command::CloseActive)),
            KeyCode::Char('?') | KeyCode::F(1) => Some(Message::ToggleHelp),
            KeyCode::Char('q') => Some(Message::Quit),
            _ => None,
        }
    }

    /// Bindings that work regardless of focus.
    fn handle_tab_key(key: KeyEvent) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::BackTab => Some(Message::Session(Command::Previous)),
            KeyCode::Tab if ctrl => Some(Message::Session(Command::Next)),
            KeyCode::PageDown if ctrl => Some(Message::Session(Command::Next)),
            KeyCode::PageUp if ctrl => Some(Message::Session(Command::Previous)),
            KeyCode::Char('c' | 'q') if ctrl => Some(Message::Quit),
            KeyCode::Char('o' | 't') if ctrl => Some(Message::Session(Command::NewDocument)),
            KeyCode::Char('w') if ctrl => Some(Message::Session(Command::CloseActive)),
            KeyCode::Char('e') if ctrl => Some(Message::Export(ExportFormat::Html)),
            KeyCode::Char('d') if ctrl => Some(Message::HalfPageDown),
            KeyCode::Char('u') if ctrl => Some(Message::HalfPageUp),
            // Ctrl+\ arrives as Ctrl+4 on most terminals.
            KeyCode::Char('\\' | '4') if ctrl => Some(Message::Session(Command::ToggleOutline)),
            KeyCode::Char(c @ '1'..='9') if ctrl || alt => Some(jump_to_digit(c)),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible || model.prompt.is_some() {
            return None;
        }

        match mouse.kind {
            MouseEventKind::ScrollDown => Some(Message::ScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp => Some(Message::ScrollUp(WHEEL_LINES)),
            MouseEventKind::Up(MouseButton::Left) => {
                let (width, height) = model.terminal_size;
                let area = Rect::new(0, 0, width, height);
                if mouse.row == area.y {
                    let labels = crate::ui::tab_labels(model.session.registry());
                    return crate::ui::tab_at_column(&labels, mouse.column)
                        .map(|idx| Message::Session(Command::JumpTo(idx + 1)));
                }
                if model.session.outline().is_visible() {
                    return outline_row_at(model, area, mouse.column, mouse.row)
                        .map(Message::OutlineClick);
                }
                None
            }
            _ => None,
        }
    }
}

fn jump_to_digit(c: char) -> Message {
    let position = c.to_digit(10).map_or(1, |d| d as usize);
    Message::Session(Command::JumpTo(position))
}

/// Filtered outline row under a click, if any.
fn outline_row_at(model: &Model, area: Rect, column: u16, row: u16) -> Option<usize> {
    let panel = crate::ui::outline_area(area);
    let inside = column >= panel.x
        && column < panel.x + panel.width
        && row > panel.y
        && row < panel.y + panel.height.saturating_sub(1);
    if !inside {
        return None;
    }
    let rows = panel.height.saturating_sub(2) as usize;
    let len = model.outline_visible_len();
    let start = crate::ui::outline_scroll_start(len, crate::ui::outline_focus_row(model), rows);
    let idx = start + (row - panel.y - 1) as usize;
    (idx < len).then_some(idx)
}
