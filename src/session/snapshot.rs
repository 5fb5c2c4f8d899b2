//! Durable description of the open documents.
//!
//! Stored as JSON:
//! `{ "tabs": [{ "id", "filePath", "displayName", "isModified", "scrollPosition" }], "activeTabId", "timestamp" }`

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Key under which the snapshot is stored.
pub const SNAPSHOT_KEY: &str = "mkreader-tabs";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub tabs: Vec<SnapshotEntry>,
    pub active_tab_id: Option<String>,
    /// Milliseconds since the Unix epoch when the snapshot was taken.
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub id: String,
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_modified: bool,
    #[serde(default)]
    pub scroll_position: usize,
}

impl SessionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// # Errors
    /// Returns an error if `json` is not a valid snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid session snapshot")
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize session snapshot")
    }
}

/// Where snapshots are kept between runs.
pub trait SnapshotStore {
    /// The stored snapshot, or `None` if nothing has been saved.
    ///
    /// # Errors
    /// Returns an error if the stored data cannot be read or parsed.
    fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// # Errors
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;
}

/// Snapshot kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        SessionSnapshot::from_json(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
            .map(Some)
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = snapshot.to_json()?;
        // Write then rename so a crash never leaves a truncated snapshot.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Rc<RefCell<Option<SessionSnapshot>>>,
    saves: Rc<Cell<usize>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        let store = Self::default();
        *store.slot.borrow_mut() = Some(snapshot);
        store
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.slot.borrow().clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        *self.slot.borrow_mut() = Some(snapshot.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> SessionSnapshot {
        SessionSnapshot {
            tabs: vec![SnapshotEntry {
                id: "tab-1".to_string(),
                file_path: Some(PathBuf::from("/docs/a.md")),
                display_name: "a".to_string(),
                is_modified: false,
                scroll_position: 12,
            }],
            active_tab_id: Some("tab-1".to_string()),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let json = sample().to_json().unwrap();
        for key in [
            "\"tabs\"",
            "\"filePath\"",
            "\"displayName\"",
            "\"isModified\"",
            "\"scrollPosition\"",
            "\"activeTabId\"",
            "\"timestamp\"",
        ] {
            assert!(json.contains(key), "missing {key} in {json}");
        }
    }

    #[test]
    fn test_parses_snapshot_with_missing_optional_fields() {
        let json = r#"{"tabs":[{"id":"tab-3","filePath":null}],"activeTabId":null}"#;
        let snapshot = SessionSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.tabs.len(), 1);
        assert_eq!(snapshot.tabs[0].file_path, None);
        assert_eq!(snapshot.tabs[0].scroll_position, 0);
        assert_eq!(snapshot.active_tab_id, None);
    }

    #[test]
    fn test_file_store_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("tabs.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_saves_and_loads() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested").join("tabs.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        assert!(!dir.path().join("nested").join("tabs.json.tmp").exists());
    }

    #[test]
    fn test_file_store_reports_corrupt_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tabs.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileSnapshotStore::new(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("tabs.json"));
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemorySnapshotStore::new();
        let view = store.clone();
        store.save(&sample()).unwrap();
        assert_eq!(view.snapshot(), Some(sample()));
        assert_eq!(view.saves(), 1);
    }
}
