use std::fmt;
use std::path::{Path, PathBuf};

use crate::document::{Header, RenderedFile, display_name};
use crate::gateway::WatchHandle;

/// Identifier of an open document. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Lifecycle of a document.
///
/// `Loading → Ready → (Rerendering → Ready)* → Closed`; a document that
/// fails to load goes straight from `Loading` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Loading,
    Ready,
    Rerendering,
    Closed,
}

impl DocumentState {
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Loading | Self::Rerendering, Self::Ready)
                | (Self::Ready, Self::Rerendering)
                | (Self::Loading | Self::Ready | Self::Rerendering, Self::Closed)
        )
    }
}

/// One open markdown source and its cached rendering.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    source_path: Option<PathBuf>,
    display_name: String,
    rendered: RenderedFile,
    state: DocumentState,
    is_modified: bool,
    scroll_offset: usize,
    generation: u64,
    watch: Option<WatchHandle>,
}

impl Document {
    /// A new document in `Loading` with no content yet.
    pub fn loading(id: DocumentId, source_path: Option<PathBuf>) -> Self {
        let display_name = display_name(source_path.as_deref());
        Self {
            id,
            source_path,
            display_name,
            rendered: RenderedFile::default(),
            state: DocumentState::Loading,
            is_modified: false,
            scroll_offset: 0,
            generation: 0,
            watch: None,
        }
    }

    pub const fn id(&self) -> DocumentId {
        self.id
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn html(&self) -> &str {
        &self.rendered.html
    }

    pub fn headers(&self) -> &[Header] {
        &self.rendered.headers
    }

    pub const fn rendered(&self) -> &RenderedFile {
        &self.rendered
    }

    pub const fn state(&self) -> DocumentState {
        self.state
    }

    pub const fn is_modified(&self) -> bool {
        self.is_modified
    }

    pub const fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Bumped each time the content is replaced.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn is_watched(&self) -> bool {
        self.watch.is_some()
    }

    pub(crate) const fn set_modified(&mut self, modified: bool) {
        self.is_modified = modified;
    }

    pub(crate) const fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll_offset = offset;
    }

    pub(crate) fn set_watch(&mut self, handle: WatchHandle) {
        self.watch = Some(handle);
    }

    fn transition(&mut self, next: DocumentState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(id = %self.id, from = ?self.state, to = ?next, "ignored invalid document transition");
            return false;
        }
        self.state = next;
        true
    }

    /// Install the first rendering and become `Ready`.
    pub(crate) fn finish_loading(&mut self, rendered: RenderedFile) -> bool {
        if self.state != DocumentState::Loading {
            return false;
        }
        self.rendered = rendered;
        self.transition(DocumentState::Ready)
    }

    pub(crate) fn begin_rerender(&mut self) -> bool {
        self.transition(DocumentState::Rerendering)
    }

    /// Replace the content after a re-render and return to `Ready`.
    pub(crate) fn finish_rerender(&mut self, rendered: RenderedFile) -> bool {
        if self.state != DocumentState::Rerendering {
            return false;
        }
        self.rendered = rendered;
        self.generation += 1;
        self.transition(DocumentState::Ready)
    }

    /// Return to `Ready` keeping the previous content.
    pub(crate) fn abort_rerender(&mut self) -> bool {
        self.state == DocumentState::Rerendering && self.transition(DocumentState::Ready)
    }

    /// Enter `Closed`, releasing the watch subscription if one is held.
    /// Returns true if a subscription was released.
    pub(crate) fn close(&mut self) -> bool {
        if !self.transition(DocumentState::Closed) {
            return false;
        }
        self.watch.take().is_some_and(|mut handle| handle.release())
    }
}
