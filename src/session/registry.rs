//! The set of open documents, in tab order, plus the active marker.
//!
//! Pure state: no I/O and no view side effects.

use std::path::Path;

use super::{Document, DocumentId, SessionError};

pub const DEFAULT_MAX_DOCUMENTS: usize = 10;

#[derive(Debug)]
pub struct Registry {
    documents: Vec<Document>,
    active: Option<DocumentId>,
    max_documents: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENTS)
    }
}

impl Registry {
    pub fn new(max_documents: usize) -> Self {
        Self {
            documents: Vec::new(),
            active: None,
            max_documents: max_documents.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub const fn max_documents(&self) -> usize {
        self.max_documents
    }

    pub fn is_full(&self) -> bool {
        self.documents.len() >= self.max_documents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn ids(&self) -> Vec<DocumentId> {
        self.documents.iter().map(Document::id).collect()
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.position(id).is_some()
    }

    /// Zero-based position of `id` in tab order.
    pub fn position(&self, id: DocumentId) -> Option<usize> {
        self.documents.iter().position(|doc| doc.id() == id)
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id() == id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|doc| doc.id() == id)
    }

    /// The document bound to `path`, which must already be resolved.
    pub fn find_by_path(&self, path: &Path) -> Option<DocumentId> {
        self.documents
            .iter()
            .find(|doc| doc.source_path() == Some(path))
            .map(Document::id)
    }

    /// Append `document`.
    ///
    /// # Errors
    /// Returns [`SessionError::CapacityExceeded`] without touching the
    /// registry when it is full.
    pub fn insert(&mut self, document: Document) -> Result<(), SessionError> {
        if self.is_full() {
            return Err(SessionError::CapacityExceeded {
                max: self.max_documents,
            });
        }
        self.documents.push(document);
        Ok(())
    }

    /// Remove and return `id`, clearing the active marker if it pointed there.
    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        let idx = self.position(id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.documents.remove(idx))
    }

    pub const fn active(&self) -> Option<DocumentId> {
        self.active
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active.and_then(|id| self.get(id))
    }

    /// Mark `id` active and return the previously active id.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if `id` is not registered.
    pub fn set_active(&mut self, id: DocumentId) -> Result<Option<DocumentId>, SessionError> {
        if !self.contains(id) {
            return Err(SessionError::NotFound(id));
        }
        Ok(self.active.replace(id))
    }

    pub const fn clear_active(&mut self) -> Option<DocumentId> {
        self.active.take()
    }

    pub fn first(&self) -> Option<DocumentId> {
        self.documents.first().map(Document::id)
    }

    /// The document after the active one, wrapping around. With nothing
    /// active this is the first document.
    pub fn next_after_active(&self) -> Option<DocumentId> {
        let len = self.documents.len();
        if len == 0 {
            return None;
        }
        let idx = self
            .active
            .and_then(|id| self.position(id))
            .map_or(0, |pos| (pos + 1) % len);
        Some(self.documents[idx].id())
    }

    /// The document before the active one, wrapping around. With nothing
    /// active this is the last document.
    pub fn previous_before_active(&self) -> Option<DocumentId> {
        let len = self.documents.len();
        if len == 0 {
            return None;
        }
        let idx = self
            .active
            .and_then(|id| self.position(id))
            .map_or(len - 1, |pos| (pos + len - 1) % len);
        Some(self.documents[idx].id())
    }

    /// The document at 1-based `position`, if in range.
    pub fn at_position(&self, position: usize) -> Option<DocumentId> {
        position
            .checked_sub(1)
            .and_then(|idx| self.documents.get(idx))
            .map(Document::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(n: u64, path: Option<&str>) -> Document {
        Document::loading(DocumentId::from_raw(n), path.map(PathBuf::from))
    }

    fn id(n: u64) -> DocumentId {
        DocumentId::from_raw(n)
    }

    fn registry_of(n: u64) -> Registry {
        let mut registry = Registry::new(10);
        for i in 1..=n {
            registry.insert(doc(i, None)).unwrap();
        }
        registry
    }

    #[test]
    fn test_insert_respects_capacity() {
        let mut registry = Registry::new(2);
        registry.insert(doc(1, None)).unwrap();
        registry.insert(doc(2, None)).unwrap();

        let err = registry.insert(doc(3, None)).unwrap_err();
        assert!(matches!(err, SessionError::CapacityExceeded { max: 2 }));
        assert_eq!(registry.ids(), vec![id(1), id(2)]);
    }

    #[test]
    fn test_find_by_path() {
        let mut registry = Registry::new(10);
        registry.insert(doc(1, Some("/a.md"))).unwrap();
        registry.insert(doc(2, None)).unwrap();
        assert_eq!(registry.find_by_path(Path::new("/a.md")), Some(id(1)));
        assert_eq!(registry.find_by_path(Path::new("/b.md")), None);
    }

    #[test]
    fn test_remove_clears_active() {
        let mut registry = registry_of(2);
        registry.set_active(id(2)).unwrap();
        let removed = registry.remove(id(2)).unwrap();
        assert_eq!(removed.id(), id(2));
        assert_eq!(registry.active(), None);
        assert!(registry.remove(id(2)).is_none());
    }

    #[test]
    fn test_set_active_unknown_is_not_found() {
        let mut registry = registry_of(1);
        let err = registry.set_active(id(9)).unwrap_err();
        assert!(matches!(err, SessionError::NotFound(missing) if missing == id(9)));
        assert_eq!(registry.active(), None);
    }

    #[test]
    fn test_set_active_returns_previous() {
        let mut registry = registry_of(2);
        assert_eq!(registry.set_active(id(1)).unwrap(), None);
        assert_eq!(registry.set_active(id(2)).unwrap(), Some(id(1)));
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut registry = registry_of(3);
        registry.set_active(id(3)).unwrap();
        assert_eq!(registry.next_after_active(), Some(id(1)));
        registry.set_active(id(1)).unwrap();
        assert_eq!(registry.previous_before_active(), Some(id(3)));
        assert_eq!(registry.next_after_active(), Some(id(2)));
    }

    #[test]
    fn test_navigation_without_active() {
        let registry = registry_of(3);
        assert_eq!(registry.next_after_active(), Some(id(1)));
        assert_eq!(registry.previous_before_active(), Some(id(3)));
        assert_eq!(Registry::new(3).next_after_active(), None);
    }

    #[test]
    fn test_at_position_is_one_based() {
        let registry = registry_of(3);
        assert_eq!(registry.at_position(1), Some(id(1)));
        assert_eq!(registry.at_position(3), Some(id(3)));
        assert_eq!(registry.at_position(0), None);
        assert_eq!(registry.at_position(4), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(Registry::new(0).max_documents(), 1);
    }
}
