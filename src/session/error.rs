use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::DocumentId;
use crate::gateway::GatewayError;

/// Failures returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not open {}: {source}", path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: GatewayError,
    },
    #[error("Cannot open more than {max} documents")]
    CapacityExceeded { max: usize },
    #[error("No open document with id {0}")]
    NotFound(DocumentId),
}

/// Why a snapshot entry was not restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry has no backing file.
    NoPath,
    /// The backing file no longer exists.
    Missing,
    /// The file exists but could not be loaded.
    LoadFailed(String),
    /// The registry was already full.
    Capacity,
    /// The file is already open as the given document.
    Duplicate(DocumentId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPath => f.write_str("no file path"),
            Self::Missing => f.write_str("file no longer exists"),
            Self::LoadFailed(message) => write!(f, "load failed: {message}"),
            Self::Capacity => f.write_str("too many documents"),
            Self::Duplicate(id) => write!(f, "already open as {id}"),
        }
    }
}

/// Non-fatal conditions. Logged and reported as events, never returned as
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionWarning {
    #[error("Live reload unavailable for {}: {message}", path.display())]
    WatchError {
        id: DocumentId,
        path: PathBuf,
        message: String,
    },
    #[error("Skipped restoring entry {index}: {reason}")]
    RestoreSkipped {
        index: usize,
        path: Option<PathBuf>,
        reason: SkipReason,
    },
}
