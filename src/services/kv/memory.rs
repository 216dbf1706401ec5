//! In-memory-only backend.
//!
//! Used when persistence is switched off: nothing is loaded at startup and
//! saves are discarded, so every restart begins with an empty store.

use super::backend::SnapshotBackend;
use super::types::{Result, Snapshot};
use async_trait::async_trait;

/// Backend that never touches disk.
///
/// Ideal for tests, local development, and ephemeral deployments.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl MemoryBackend {
    /// Creates a new in-memory backend.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SnapshotBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<Snapshot>> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_is_always_empty() {
        let backend = MemoryBackend::new();
        assert!(backend.load().await.unwrap().is_none());

        let mut snapshot = Snapshot::new();
        snapshot.insert("video:1".to_string(), json!({"title": "A"}));
        backend.save(&snapshot).await.unwrap();

        // Saves are discarded
        assert!(backend.load().await.unwrap().is_none());
        assert!(!backend.is_persistent());
    }
}
