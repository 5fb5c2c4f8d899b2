//! Open documents and their lifecycle.
//!
//! This module handles:
//! - The document registry (tab order, active document, capacity)
//! - Opening, switching, closing and restoring documents
//! - Ordering the outline rebuild and the diagram → highlight passes
//! - Persisting the registry snapshot after every lifecycle change
//! - Live reload from file-watch signals

mod debounce;
mod document;
mod error;
mod events;
mod manager;
pub mod registry;
pub mod snapshot;

pub use document::{Document, DocumentId, DocumentState};
pub use error::{SessionError, SessionWarning, SkipReason};
pub use events::{Command, Dispatched, SessionEvent};
pub use manager::{
    CloseOutcome, ConfirmClose, RestoreReport, SessionManager, SessionOptions, StartupReport,
    TickReport,
};
pub use registry::Registry;
pub use snapshot::{
    FileSnapshotStore, MemorySnapshotStore, SNAPSHOT_KEY, SessionSnapshot, SnapshotEntry,
    SnapshotStore,
};
