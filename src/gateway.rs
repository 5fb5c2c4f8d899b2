//! Filesystem access for the session: reading and rendering markdown files,
//! existence checks, and change subscriptions.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::{RenderedFile, render_markdown};
use crate::watcher::FileWatcher;

/// Callback invoked when a watched file changes. Called from a background
/// thread, so it should only forward a signal.
pub type ChangeCallback = Box<dyn Fn() + Send + 'static>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render {}: {message}", path.display())]
    Render { path: PathBuf, message: String },
    #[error("Failed to watch {}: {message}", path.display())]
    Watch { path: PathBuf, message: String },
}

/// Read, probe and watch markdown files.
pub trait FileGateway {
    /// Read `path` and render it to HTML plus its header list.
    ///
    /// # Errors
    /// Returns [`GatewayError::Read`] if the file cannot be read and
    /// [`GatewayError::Render`] if rendering fails.
    fn render_file(&self, path: &Path) -> Result<RenderedFile, GatewayError>;

    /// Whether `path` names an existing file. Never fails.
    fn file_exists(&self, path: &Path) -> bool;

    /// Subscribe to changes of `path`. Dropping or releasing the returned
    /// handle ends the subscription.
    ///
    /// # Errors
    /// Returns [`GatewayError::Watch`] if the subscription cannot be set up.
    fn watch_file(&self, path: &Path, on_change: ChangeCallback)
    -> Result<WatchHandle, GatewayError>;
}

/// Ownership of one file-watch subscription.
///
/// The unsubscribe action runs at most once: on the first [`release`] or on
/// drop, whichever comes first.
///
/// [`release`]: WatchHandle::release
#[must_use = "dropping a WatchHandle ends the subscription"]
pub struct WatchHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchHandle {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn inert() -> Self {
        Self { release: None }
    }

    /// Tie the subscription to the lifetime of `guard`.
    pub fn holding<T: Send + 'static>(guard: T) -> Self {
        Self::new(move || drop(guard))
    }

    /// Run the unsubscribe action. Returns false if it already ran.
    pub fn release(&mut self) -> bool {
        match self.release.take() {
            Some(release) => {
                release();
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// [`FileGateway`] over the local filesystem and notify.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsGateway;

impl FsGateway {
    pub const fn new() -> Self {
        Self
    }
}

impl FileGateway for FsGateway {
    fn render_file(&self, path: &Path) -> Result<RenderedFile, GatewayError> {
        let _scope = crate::perf::scope("gateway.render_file");
        let source = std::fs::read_to_string(path).map_err(|source| GatewayError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        crate::perf::log_event(
            "gateway.read",
            format!("path={} bytes={}", path.display(), source.len()),
        );
        render_markdown(&source).map_err(|err| GatewayError::Render {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        })
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn watch_file(
        &self,
        path: &Path,
        on_change: ChangeCallback,
    ) -> Result<WatchHandle, GatewayError> {
        let watcher = FileWatcher::new(path, on_change).map_err(|err| GatewayError::Watch {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        tracing::debug!(path = %watcher.target_path().display(), "watch established");
        Ok(WatchHandle::holding(watcher))
    }
}

/// Resolve `path` to the absolute form used as the registry's identity key.
///
/// Existing files are canonicalized so that different spellings of the same
/// file compare equal; other paths are made absolute without touching the
/// filesystem.
pub fn resolve_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn test_watch_handle_releases_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let mut handle = WatchHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(handle.release());
        assert!(!handle.release());
        drop(handle);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_watch_handle_releases_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let handle = WatchHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(handle);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inert_handle_is_already_released() {
        let mut handle = WatchHandle::inert();
        assert!(handle.is_released());
        assert!(!handle.release());
    }

    #[test]
    fn test_render_file_reads_and_renders() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Title\n\nBody\n").unwrap();

        let rendered = FsGateway.render_file(&path).unwrap();
        assert_eq!(rendered.headers.len(), 1);
        assert!(rendered.html.contains("Body"));
    }

    #[test]
    fn test_render_missing_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = FsGateway
            .render_file(&dir.path().join("missing.md"))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Read { .. }));
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn test_file_exists_never_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        assert!(!FsGateway.file_exists(&path));
        std::fs::write(&path, "x").unwrap();
        assert!(FsGateway.file_exists(&path));
        assert!(!FsGateway.file_exists(dir.path()));
    }

    #[test]
    fn test_resolve_path_unifies_spellings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "x").unwrap();
        let dotted = dir.path().join(".").join("doc.md");
        assert_eq!(resolve_path(&path), resolve_path(&dotted));
        assert!(resolve_path(Path::new("relative.md")).is_absolute());
    }
}
