// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. session::SessionManager)
    clippy::module_name_repetitions
)]

//! # mkreader
//!
//! A Markdown reader with document tabs.
//!
//! mkreader keeps a set of open Markdown documents and shows one at a time:
//! - Tabs with open, close, next/previous and jump-to-position commands
//! - A header outline that follows the scroll position
//! - Live reload when a file changes on disk
//! - Diagram and syntax-highlight passes over the rendered HTML
//! - Tabs restored from the previous session
//! - Export of the current document
//!
//! ## Architecture
//!
//! The core is [`session::SessionManager`], a context object that owns the
//! document registry, the outline and the content surface. Everything it
//! needs from the outside world comes through traits: [`gateway::FileGateway`]
//! for reading and watching files, [`session::SnapshotStore`] for
//! persistence, and [`view::ContentSurface`] for the display.
//!
//! The terminal host in [`app`] and [`ui`] follows The Elm Architecture:
//! - **Model**: Application state, including the session
//! - **Message**: Events and actions
//! - **Update**: State transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`session`]: Documents, registry, snapshots, the session manager
//! - [`document`]: Markdown rendering and header extraction
//! - [`gateway`]: File reading and watching
//! - [`pipeline`]: Ordered post-render passes
//! - [`outline`]: Header outline with filtering
//! - [`export`]: Export coordinator and the HTML exporter
//! - [`app`]: Terminal event loop and key dispatch
//! - [`ui`]: Terminal rendering

pub mod app;
pub mod config;
pub mod document;
pub mod export;
pub mod gateway;
pub mod highlight;
pub mod mermaid;
pub mod outline;
pub mod perf;
pub mod pipeline;
pub mod session;
pub mod ui;
pub mod view;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::session::{Command, DocumentId, SessionManager, SessionOptions};
    pub use crate::ui::viewport::Viewport;
}
