//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions that do not touch the file system
//! - [`App::run`]: Main event loop with rendering
//!
//! Tab commands, opening and exporting run as side effects after
//! `update`, against the session the model owns.

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, Prompt, PromptKind, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::session::SessionOptions;

/// Owns the startup configuration and runs the terminal host.
pub struct App {
    files: Vec<PathBuf>,
    restore: bool,
    outline_visible: bool,
    diagrams: bool,
    highlight: bool,
    options: SessionOptions,
    snapshot_path: PathBuf,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create an application that opens `files` at startup.
    ///
    /// The session snapshot lives at `snapshot_path`.
    pub fn new(files: Vec<PathBuf>, snapshot_path: PathBuf) -> Self {
        Self {
            files,
            restore: true,
            outline_visible: true,
            diagrams: true,
            highlight: true,
            options: SessionOptions::default(),
            snapshot_path,
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Restore the previous session when no file opens on the command line.
    pub const fn with_restore(mut self, enabled: bool) -> Self {
        self.restore = enabled;
        self
    }

    /// Set initial outline visibility.
    pub const fn with_outline_visible(mut self, visible: bool) -> Self {
        self.outline_visible = visible;
        self
    }

    /// Enable or disable the diagram and highlight passes.
    pub const fn with_passes(mut self, diagrams: bool, highlight: bool) -> Self {
        self.diagrams = diagrams;
        self.highlight = highlight;
        self
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
