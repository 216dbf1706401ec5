//! Backend trait for snapshot persistence.
//!
//! The store keeps its mapping in memory and hands a copy to a backend
//! whenever it persists. Backends decide where (and whether) that copy goes:
//! a JSON file on disk, or nowhere at all for in-memory deployments.

use super::types::{Result, Snapshot};
use async_trait::async_trait;

/// Persistence backend for [`KvStore`](super::KvStore).
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
///
/// # Example
///
/// ```ignore
/// use reelkv::services::kv::{FileBackend, KvStore};
///
/// let store = KvStore::custom(FileBackend::new("/var/lib/reel/db.json")).await;
/// ```
#[async_trait]
pub trait SnapshotBackend: Send + Sync + 'static {
    /// Reads the last saved snapshot.
    ///
    /// Returns `Ok(None)` when no snapshot has been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read or parsed.
    async fn load(&self) -> Result<Option<Snapshot>>;

    /// Replaces the stored snapshot with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written.
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Short human-readable description used in log events.
    fn describe(&self) -> String;

    /// Whether saves reach durable storage.
    ///
    /// The store skips copying its mapping for backends that return `false`.
    fn is_persistent(&self) -> bool {
        true
    }
}
