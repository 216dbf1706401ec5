//! Shared types for the KV store: the in-memory mapping and snapshot errors.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The whole store contents, keyed by string.
///
/// A sorted map keeps prefix scans cheap and the snapshot file stable
/// between saves.
pub type Snapshot = BTreeMap<String, Value>;

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Errors raised while loading or saving a snapshot.
///
/// These never escape a mutating store call; they are logged there and
/// only surfaced by [`KvStore::flush`](super::KvStore::flush).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SnapshotError {
    /// Reading, writing or renaming the snapshot file failed.
    #[error("snapshot IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file is not valid JSON.
    #[error("failed to parse snapshot {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot parsed, but its top level is not a JSON object.
    #[error("snapshot {path:?} is not a JSON object")]
    NotAnObject { path: PathBuf },

    /// The in-memory mapping could not be encoded.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The blocking IO task panicked or was cancelled.
    #[error("snapshot task failed: {0}")]
    Join(String),
}

impl SnapshotError {
    /// Create an IO error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = SnapshotError::NotAnObject {
            path: PathBuf::from("/tmp/db.json"),
        };
        assert!(err.to_string().contains("db.json"));

        let err = SnapshotError::io(
            "/tmp/db.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("db.json"));
        assert!(msg.contains("denied"));
    }
}
