//! Document outline: a header tree with a scroll-synchronized active entry.

use crate::document::Header;

/// Shown in place of the tree when the document has no headers.
pub const EMPTY_PLACEHOLDER: &str = "No headers";

/// Default number of rows below the viewport top that still count as
/// "reached" when picking the active header.
pub const DEFAULT_LOOKAHEAD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub header: Header,
    /// Nesting depth in the tree; top-level entries are 0.
    pub depth: usize,
    /// Index of the nearest preceding entry with a lower level.
    pub parent: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct OutlineIndex {
    entries: Vec<OutlineEntry>,
    active: Option<usize>,
    filter: String,
    visible: bool,
    lookahead: usize,
}

impl Default for OutlineIndex {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}

impl OutlineIndex {
    pub const fn new(lookahead: usize) -> Self {
        Self {
            entries: Vec::new(),
            active: None,
            filter: String::new(),
            visible: true,
            lookahead,
        }
    }

    /// Replace the tree with one built from `headers`.
    ///
    /// The active entry is cleared; the next [`update_active`] call picks it
    /// again from the scroll position. The filter is kept.
    ///
    /// [`update_active`]: OutlineIndex::update_active
    pub fn rebuild(&mut self, headers: &[Header]) {
        let mut entries: Vec<OutlineEntry> = Vec::with_capacity(headers.len());
        // Indices of open ancestors, innermost last.
        let mut stack: Vec<usize> = Vec::new();

        for header in headers {
            while let Some(&top) = stack.last() {
                if entries[top].header.level < header.level {
                    break;
                }
                stack.pop();
            }
            let parent = stack.last().copied();
            let depth = parent.map_or(0, |p| entries[p].depth + 1);
            stack.push(entries.len());
            entries.push(OutlineEntry {
                header: header.clone(),
                depth,
                parent,
            });
        }

        self.entries = entries;
        self.active = None;
    }

    /// Drop all entries, the active marker and the filter.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.active = None;
        self.filter.clear();
    }

    /// Recompute the active entry from the scroll position.
    ///
    /// The active entry is the last one, in document order, whose position
    /// is at most `lookahead` rows below `scroll_top`. Entries the surface
    /// cannot place are skipped. Returns the new active index.
    pub fn update_active(
        &mut self,
        scroll_top: usize,
        position_of: impl Fn(&str) -> Option<usize>,
    ) -> Option<usize> {
        let threshold = scroll_top.saturating_add(self.lookahead);
        self.active = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| position_of(&entry.header.id).map(|pos| (idx, pos)))
            .take_while(|(_, pos)| *pos <= threshold)
            .last()
            .map(|(idx, _)| idx);
        self.active
    }

    /// Mark the entry with `id` active. Returns false if no entry matches.
    pub fn set_active_id(&mut self, id: &str) -> bool {
        match self.entries.iter().position(|e| e.header.id == id) {
            Some(idx) => {
                self.active = Some(idx);
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_entry(&self) -> Option<&OutlineEntry> {
        self.active.and_then(|idx| self.entries.get(idx))
    }

    pub fn entries(&self) -> &[OutlineEntry] {
        &self.entries
    }

    pub fn entry(&self, idx: usize) -> Option<&OutlineEntry> {
        self.entries.get(idx)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries matching the filter, with their indices into [`entries`].
    ///
    /// [`entries`]: OutlineIndex::entries
    pub fn visible_entries(&self) -> Vec<(usize, &OutlineEntry)> {
        let needle = self.filter.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                needle.is_empty() || entry.header.text.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into().trim().to_string();
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    pub const fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Flip visibility and return the new state.
    pub const fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub const fn lookahead(&self) -> usize {
        self.lookahead
    }

    pub const fn set_lookahead(&mut self, lookahead: usize) {
        self.lookahead = lookahead;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn header(id: &str, level: u8) -> Header {
        Header {
            id: id.to_string(),
            level,
            text: id.replace('-', " "),
            line: 0,
        }
    }

    fn sample() -> Vec<Header> {
        vec![
            header("intro", 1),
            header("install", 2),
            header("linux", 3),
            header("macos", 3),
            header("usage", 2),
            header("appendix", 1),
        ]
    }

    #[test]
    fn test_rebuild_computes_tree_shape() {
        let mut outline = OutlineIndex::default();
        outline.rebuild(&sample());

        let shape: Vec<(usize, Option<usize>)> = outline
            .entries()
            .iter()
            .map(|e| (e.depth, e.parent))
            .collect();
        assert_eq!(
            shape,
            vec![
                (0, None),
                (1, Some(0)),
                (2, Some(1)),
                (2, Some(1)),
                (1, Some(0)),
                (0, None),
            ]
        );
    }

    #[test]
    fn test_rebuild_handles_skipped_levels() {
        let mut outline = OutlineIndex::default();
        outline.rebuild(&[header("a", 2), header("b", 4), header("c", 3)]);
        let depths: Vec<usize> = outline.entries().iter().map(|e| e.depth).collect();
        assert_eq!(depths, vec![0, 1, 1]);
    }

    #[test]
    fn test_active_is_last_header_within_lookahead() {
        let mut outline = OutlineIndex::new(3);
        outline.rebuild(&sample());
        let positions: HashMap<&str, usize> = [
            ("intro", 0),
            ("install", 10),
            ("linux", 20),
            ("macos", 30),
            ("usage", 40),
            ("appendix", 50),
        ]
        .into_iter()
        .collect();
        let pos = |id: &str| positions.get(id).copied();

        assert_eq!(outline.update_active(0, pos), Some(0));
        assert_eq!(outline.update_active(7, pos), Some(1));
        assert_eq!(outline.update_active(29, pos), Some(3));
        assert_eq!(outline.update_active(100, pos), Some(5));
    }

    #[test]
    fn test_no_active_before_first_header() {
        let mut outline = OutlineIndex::new(3);
        outline.rebuild(&[header("late", 1)]);
        assert_eq!(outline.update_active(0, |_| Some(20)), None);
        assert!(outline.active_entry().is_none());
    }

    #[test]
    fn test_rebuild_with_empty_list_clears_active() {
        let mut outline = OutlineIndex::default();
        outline.rebuild(&sample());
        outline.set_active_id("usage");
        assert_eq!(outline.active(), Some(4));

        outline.rebuild(&[]);
        assert!(outline.is_empty());
        assert_eq!(outline.active(), None);
        assert_eq!(outline.update_active(10, |_| Some(0)), None);
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let mut outline = OutlineIndex::default();
        outline.rebuild(&sample());
        outline.set_filter("  MAC ");

        let visible: Vec<usize> = outline.visible_entries().iter().map(|(i, _)| *i).collect();
        assert_eq!(visible, vec![3]);

        outline.set_filter("");
        assert_eq!(outline.visible_entries().len(), 6);
    }

    #[test]
    fn test_reset_clears_everything_but_visibility() {
        let mut outline = OutlineIndex::default();
        outline.rebuild(&sample());
        outline.set_filter("in");
        outline.set_active_id("intro");
        outline.set_visible(false);

        outline.reset();
        assert!(outline.is_empty());
        assert_eq!(outline.filter(), "");
        assert_eq!(outline.active(), None);
        assert!(!outline.is_visible());
    }

    #[test]
    fn test_toggle_visible() {
        let mut outline = OutlineIndex::default();
        assert!(outline.is_visible());
        assert!(!outline.toggle_visible());
        assert!(outline.toggle_visible());
    }

    #[test]
    fn test_set_active_id_unknown() {
        let mut outline = OutlineIndex::default();
        outline.rebuild(&sample());
        assert!(!outline.set_active_id("missing"));
        assert_eq!(outline.active(), None);
    }
}
