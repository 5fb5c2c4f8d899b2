use std::collections::HashMap;

use super::DocumentId;

/// Coalesces file-change signals per document.
///
/// Each signal restarts that document's quiet window; the reload fires once
/// no signal has arrived for `delay_ms`.
#[derive(Debug)]
pub(super) struct ReloadDebouncer {
    delay_ms: u64,
    pending: HashMap<DocumentId, u64>,
}

impl ReloadDebouncer {
    pub(super) fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: HashMap::new(),
        }
    }

    pub(super) fn queue(&mut self, id: DocumentId, now_ms: u64) {
        self.pending.insert(id, now_ms);
    }

    /// Documents whose quiet window has elapsed, in id order.
    pub(super) fn take_ready(&mut self, now_ms: u64) -> Vec<DocumentId> {
        let mut ready: Vec<DocumentId> = self
            .pending
            .iter()
            .filter(|(_, queued_at)| now_ms.saturating_sub(**queued_at) >= self.delay_ms)
            .map(|(id, _)| *id)
            .collect();
        ready.sort_unstable();
        for id in &ready {
            self.pending.remove(id);
        }
        ready
    }

    pub(super) fn cancel(&mut self, id: DocumentId) {
        self.pending.remove(&id);
    }

    pub(super) fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> DocumentId {
        DocumentId::from_raw(n)
    }

    #[test]
    fn test_fires_after_quiet_window() {
        let mut debouncer = ReloadDebouncer::new(200);
        debouncer.queue(id(1), 0);
        assert!(debouncer.take_ready(150).is_empty());
        assert_eq!(debouncer.take_ready(200), vec![id(1)]);
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_new_signal_restarts_window() {
        let mut debouncer = ReloadDebouncer::new(200);
        debouncer.queue(id(1), 0);
        debouncer.queue(id(1), 150);
        assert!(debouncer.take_ready(300).is_empty());
        assert_eq!(debouncer.take_ready(350), vec![id(1)]);
    }

    #[test]
    fn test_documents_are_independent() {
        let mut debouncer = ReloadDebouncer::new(100);
        debouncer.queue(id(2), 0);
        debouncer.queue(id(1), 50);
        assert_eq!(debouncer.take_ready(100), vec![id(2)]);
        debouncer.cancel(id(1));
        assert!(!debouncer.is_pending());
    }
}
