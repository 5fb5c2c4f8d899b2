use crate::app::{Model, Prompt, PromptKind};
use crate::export::ExportFormat;
use crate::session::Command;
use crate::ui::viewport::Viewport;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Navigation
    /// Scroll up by n lines
    ScrollUp(usize),
    /// Scroll down by n lines
    ScrollDown(usize),
    PageUp,
    PageDown,
    HalfPageUp,
    HalfPageDown,
    GoToTop,
    GoToBottom,

    // Tabs
    /// A tab-level command; executed against the session in side effects
    Session(Command),
    /// Open the path typed into the open prompt
    OpenPath(String),

    // Outline
    /// Move focus between the outline and the content
    SwitchFocus,
    OutlineUp,
    OutlineDown,
    /// Jump to the selected outline entry
    OutlineSelect,
    /// Select and jump to the outline row at the index
    OutlineClick(usize),
    /// Start typing an outline filter
    StartFilter,
    /// Clear the outline filter
    ClearFilter,

    // Prompt
    /// Start typing a path to open
    StartOpen,
    /// Replace the prompt text
    PromptInput(String),
    /// Accept the prompt
    PromptSubmit,
    /// Dismiss the prompt
    PromptCancel,

    /// Export the active document
    Export(ExportFormat),

    // Application
    ToggleHelp,
    HideHelp,
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw without a state change
    Redraw,
    Quit,
}

/// Apply a message to the model.
///
/// Session commands and file-system work are left to the side-effect
/// handler; this only touches scroll state, focus and chrome.
pub fn update(mut model: Model, msg: Message) -> Model {
    // A forced close needs two consecutive close requests.
    if !matches!(msg, Message::Session(Command::CloseActive) | Message::Redraw) {
        model.pending_close = None;
    }

    match msg {
        Message::ScrollUp(n) => scroll(&mut model, |vp| vp.scroll_up(n)),
        Message::ScrollDown(n) => scroll(&mut model, |vp| vp.scroll_down(n)),
        Message::PageUp => scroll(&mut model, Viewport::page_up),
        Message::PageDown => scroll(&mut model, Viewport::page_down),
        Message::HalfPageUp => scroll(&mut model, Viewport::half_page_up),
        Message::HalfPageDown => scroll(&mut model, Viewport::half_page_down),
        Message::GoToTop => scroll(&mut model, Viewport::go_to_top),
        Message::GoToBottom => scroll(&mut model, Viewport::go_to_bottom),

        Message::SwitchFocus => {
            if model.session.outline().is_visible() {
                model.outline_focused = !model.outline_focused;
                if model.outline_focused && model.outline_selected.is_none() {
                    model.outline_selected = model.active_outline_row();
                }
            } else {
                model.outline_focused = false;
            }
        }
        Message::OutlineUp => {
            let len = model.outline_visible_len();
            if len > 0 {
                model.outline_selected = Some(
                    model
                        .outline_selected
                        .map_or(len - 1, |row| row.saturating_sub(1)),
                );
            }
        }
        Message::OutlineDown => {
            let len = model.outline_visible_len();
            if len > 0 {
                model.outline_selected =
                    Some(model.outline_selected.map_or(0, |row| (row + 1).min(len - 1)));
            }
        }
        Message::OutlineSelect => jump_to_selected(&mut model),
        Message::OutlineClick(row) => {
            if row < model.outline_visible_len() {
                model.outline_selected = Some(row);
                jump_to_selected(&mut model);
            }
        }
        Message::StartFilter => {
            if !model.session.outline().is_visible() {
                model.session.outline_mut().set_visible(true);
                model.sync_layout();
            }
            let mut prompt = Prompt::new(PromptKind::Filter);
            model
                .session
                .outline()
                .filter()
                .clone_into(&mut prompt.text);
            model.prompt = Some(prompt);
        }
        Message::ClearFilter => {
            model.session.outline_mut().set_filter("");
            model.clamp_outline_selection();
        }

        Message::StartOpen => {
            model.prompt = Some(Prompt::new(PromptKind::Open));
        }
        Message::PromptInput(text) => {
            if let Some(prompt) = model.prompt.as_mut() {
                prompt.text = text;
                if prompt.kind == PromptKind::Filter {
                    let filter = prompt.text.clone();
                    model.session.outline_mut().set_filter(filter);
                    model.outline_selected = (model.outline_visible_len() > 0).then_some(0);
                }
            }
        }
        Message::PromptCancel => {
            if let Some(prompt) = model.prompt.take()
                && prompt.kind == PromptKind::Filter
            {
                model.session.outline_mut().set_filter("");
                model.clamp_outline_selection();
            }
        }
        Message::PromptSubmit => {
            // Open prompts are consumed by the side-effect handler.
            if model
                .prompt
                .as_ref()
                .is_some_and(|prompt| prompt.kind == PromptKind::Filter)
            {
                model.prompt = None;
                model.outline_focused = true;
                model.clamp_outline_selection();
            }
        }

        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            model.sync_layout();
        }
        Message::Quit => model.should_quit = true,

        Message::Session(_) | Message::OpenPath(_) | Message::Export(_) | Message::Redraw => {}
    }

    model
}

fn scroll(model: &mut Model, apply: impl FnOnce(&mut Viewport)) {
    apply(model.session.surface_mut().viewport_mut());
    model.session.refresh_outline();
}

fn jump_to_selected(model: &mut Model) {
    let Some(entry) = model.selected_outline_entry() else {
        return;
    };
    model.session.jump_to_header(entry);
}

