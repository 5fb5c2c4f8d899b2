use super::{DocumentId, SessionWarning};

/// Changes the view layer reacts to. Drained with
/// [`SessionManager::drain_events`](super::SessionManager::drain_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened(DocumentId),
    Activated {
        id: DocumentId,
        previous: Option<DocumentId>,
    },
    Closed(DocumentId),
    Reloaded(DocumentId),
    /// The registry has no active document and the welcome page is shown.
    Welcome,
    Warning(SessionWarning),
}

/// Host-level actions bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NewDocument,
    CloseActive,
    Next,
    Previous,
    /// 1-based tab position.
    JumpTo(usize),
    ToggleOutline,
}

/// What a [`Command`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The host should ask the user for a file to open.
    OpenRequested,
    Activated(DocumentId),
    Closed(DocumentId),
    /// Close was declined because the document has unsaved changes.
    CloseDeclined(DocumentId),
    OutlineToggled(bool),
    Ignored,
}
