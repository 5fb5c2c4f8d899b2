use std::path::{Path, PathBuf};

use crate::app::{App, Message, Model, Prompt, PromptKind, ToastLevel};
use crate::export::ExportFormat;
use crate::session::{CloseOutcome, Command, Dispatched, SessionError};

impl App {
    pub(super) fn handle_message_side_effects(&self, model: &mut Model, msg: &Message) {
        match msg {
            Message::Session(command) => Self::run_command(model, *command),
            Message::OpenPath(raw) => Self::open_path(model, raw),
            Message::PromptSubmit => {
                if let Some(prompt) = model.prompt.take_if(|p| p.kind == PromptKind::Open) {
                    Self::open_path(model, &prompt.text);
                }
            }
            Message::Export(format) => Self::export_active(model, *format),
            _ => {}
        }
        model.report_session_events();
    }

    fn run_command(model: &mut Model, command: Command) {
        if command == Command::CloseActive
            && let Some(pending) = model.pending_close.take()
            && model.session.active_id() == Some(pending)
        {
            match model.session.close(pending, true) {
                Ok(CloseOutcome::Closed { .. }) => {
                    model.show_toast(ToastLevel::Info, "Closed without saving");
                }
                Ok(CloseOutcome::Cancelled) => {}
                Err(err) => model.show_toast(ToastLevel::Error, err.to_string()),
            }
            return;
        }

        match model.session.dispatch(command) {
            Dispatched::OpenRequested => {
                model.prompt = Some(Prompt::new(PromptKind::Open));
            }
            Dispatched::CloseDeclined(id) => {
                model.pending_close = Some(id);
                let name = model
                    .session
                    .document(id)
                    .map_or_else(String::new, |doc| doc.display_name().to_string());
                model.show_toast(
                    ToastLevel::Warning,
                    format!("{name} has unsaved changes; close again to discard them"),
                );
            }
            Dispatched::OutlineToggled(_) => model.sync_layout(),
            Dispatched::Activated(_) | Dispatched::Closed(_) | Dispatched::Ignored => {}
        }
    }

    fn open_path(model: &mut Model, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return;
        }
        let path = expand_home(trimmed);
        match model.session.open(&path) {
            Ok(id) => {
                tracing::debug!(%id, path = %path.display(), "opened from prompt");
            }
            Err(err @ SessionError::CapacityExceeded { .. }) => {
                model.show_toast(ToastLevel::Warning, err.to_string());
            }
            Err(err) => {
                crate::perf::log_event("open.error", format!("path={} err={err}", path.display()));
                model.show_toast(ToastLevel::Error, err.to_string());
            }
        }
    }

    fn export_active(model: &mut Model, format: ExportFormat) {
        match model.exporter.export(&model.session, format, None) {
            Ok(outcome) => model.show_toast(
                ToastLevel::Info,
                format!("Exported {}", outcome.path.display()),
            ),
            Err(err) => model.show_toast(ToastLevel::Error, err.to_string()),
        }
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(raw: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => Path::new(raw).to_path_buf(),
    }
}
