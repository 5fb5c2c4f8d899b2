use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::export::ExportCoordinator;
use crate::session::{DocumentId, SessionEvent, SessionManager, SessionWarning};
use crate::ui::TerminalSurface;

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// What a line-input prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// A path to open in a new tab
    Open,
    /// Outline filter text, applied as it is typed
    Filter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub text: String,
}

impl Prompt {
    pub const fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            text: String::new(),
        }
    }

    pub const fn label(&self) -> &'static str {
        match self.kind {
            PromptKind::Open => "Open: ",
            PromptKind::Filter => "Filter: ",
        }
    }
}

/// The complete application state.
///
/// Document state lives in the session; everything else here is host
/// chrome: focus, prompts, toasts and overlays.
pub struct Model {
    /// Open documents, the content surface and the outline
    pub session: SessionManager<TerminalSurface>,
    pub exporter: ExportCoordinator,
    /// Focus: true = outline, false = content
    pub outline_focused: bool,
    /// Selected row among the outline's filtered entries
    pub outline_selected: Option<usize>,
    pub prompt: Option<Prompt>,
    pub help_visible: bool,
    /// Set after a close was declined for unsaved changes; a second close
    /// request for the same document forces it.
    pub pending_close: Option<DocumentId>,
    pub should_quit: bool,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    pub terminal_size: (u16, u16),
    toast: Option<Toast>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("session", &self.session)
            .field("outline_focused", &self.outline_focused)
            .field("prompt", &self.prompt)
            .field("terminal_size", &self.terminal_size)
            .finish_non_exhaustive()
    }
}

impl Model {
    pub fn new(session: SessionManager<TerminalSurface>, terminal_size: (u16, u16)) -> Self {
        let mut model = Self {
            session,
            exporter: ExportCoordinator::new(),
            outline_focused: false,
            outline_selected: None,
            prompt: None,
            help_visible: false,
            pending_close: None,
            should_quit: false,
            config_global_path: None,
            config_local_path: None,
            terminal_size,
            toast: None,
        };
        model.sync_layout();
        model
    }

    /// Fit the content surface to the terminal and the outline's
    /// visibility.
    pub fn sync_layout(&mut self) {
        let (width, height) = self.terminal_size;
        let outline_visible = self.session.outline().is_visible();
        let content_width = crate::ui::document_content_width(width, outline_visible);
        let content_height = crate::ui::content_height(height);
        self.session
            .surface_mut()
            .resize(content_width, content_height);
        self.session.refresh_outline();
        if !outline_visible {
            self.outline_focused = false;
        }
    }

    /// True when the outline panel takes keyboard input.
    pub const fn outline_has_focus(&self) -> bool {
        self.outline_focused && self.session.outline().is_visible()
    }

    /// Number of outline rows the filter currently lets through.
    pub fn outline_visible_len(&self) -> usize {
        self.session.outline().visible_entries().len()
    }

    /// Outline entry index behind the selected row.
    pub fn selected_outline_entry(&self) -> Option<usize> {
        let row = self.outline_selected?;
        self.session
            .outline()
            .visible_entries()
            .get(row)
            .map(|(idx, _)| *idx)
    }

    /// Row of the outline's active entry among the filtered rows.
    pub fn active_outline_row(&self) -> Option<usize> {
        let outline = self.session.outline();
        let active = outline.active()?;
        outline
            .visible_entries()
            .iter()
            .position(|(idx, _)| *idx == active)
    }

    pub(super) fn clamp_outline_selection(&mut self) {
        let len = self.outline_visible_len();
        self.outline_selected = match self.outline_selected {
            _ if len == 0 => None,
            Some(row) => Some(row.min(len - 1)),
            None => None,
        };
    }

    /// Turn pending session events into toasts and chrome resets.
    ///
    /// Returns true if anything was drained.
    pub(super) fn report_session_events(&mut self) -> bool {
        let events = self.session.drain_events();
        for event in &events {
            match event {
                // Skipped restore entries are expected after files move.
                SessionEvent::Warning(warning @ SessionWarning::RestoreSkipped { .. }) => {
                    tracing::info!(%warning, "session warning");
                }
                SessionEvent::Warning(warning) => {
                    tracing::warn!(%warning, "session warning");
                    self.show_toast(ToastLevel::Warning, warning.to_string());
                }
                SessionEvent::Activated { .. } | SessionEvent::Welcome => {
                    self.outline_selected = None;
                }
                SessionEvent::Reloaded(_) => self.clamp_outline_selection(),
                SessionEvent::Opened(_) | SessionEvent::Closed(_) => {}
            }
        }
        !events.is_empty()
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
