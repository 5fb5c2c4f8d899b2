//! File watching for live reload.
//!
//! Uses notify crate for cross-platform file system events. Debouncing is
//! left to the receiver; this layer only filters events down to the one file.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a single file and invokes a callback on every relevant event.
///
/// The watch stops when the value is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    target: WatchTarget,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("target", &self.target.path)
            .field("root", &self.target.root)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct WatchTarget {
    root: PathBuf,
    path: PathBuf,
    name: Option<OsString>,
}

impl WatchTarget {
    fn new(path: &Path) -> Self {
        // Canonicalize so event paths from the OS (which are always absolute
        // and canonical) match our stored paths.
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let name = path.file_name().map(std::ffi::OsStr::to_os_string);
        let root = watch_root_for(&path);
        Self { root, path, name }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| {
            path == &self.root
                || path == &self.path
                || self
                    .name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

impl FileWatcher {
    /// Watch `path`, calling `on_change` from the notify thread for each
    /// relevant event.
    ///
    /// The parent directory is watched rather than the file, so editors that
    /// save by rename still produce events.
    ///
    /// # Errors
    /// Returns an error if the file watcher cannot be created or the path cannot be watched.
    pub fn new<F>(path: impl AsRef<Path>, on_change: F) -> notify::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let target = WatchTarget::new(path.as_ref());
        let filter = target.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(ev) if filter.is_relevant(&ev) => {
                    crate::perf::log_event(
                        "watcher.change",
                        format!("kind={:?} target={}", ev.kind, filter.path.display()),
                    );
                    on_change();
                }
                Ok(ev) => {
                    crate::perf::log_event(
                        "watcher.irrelevant",
                        format!("kind={:?} paths={:?}", ev.kind, ev.paths),
                    );
                }
                Err(err) => {
                    tracing::debug!(%err, "file watcher error");
                    crate::perf::log_event("watcher.error", format!("{err}"));
                }
            }
        })?;
        watcher.watch(&target.root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            target,
        })
    }

    /// The canonical path of the file being watched.
    pub fn target_path(&self) -> &Path {
        &self.target.path
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
