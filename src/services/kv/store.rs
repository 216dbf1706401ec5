//! High-level `KvStore` over a snapshot backend.
//!
//! The mapping lives in memory behind a single writer lock and is the source
//! of truth for the running process. Every mutating call rewrites the whole
//! snapshot through the backend; save failures are logged and swallowed.

use super::backend::SnapshotBackend;
use super::file::FileBackend;
use super::keys;
use super::memory::MemoryBackend;
use super::types::{Result, Snapshot};
use crate::config::StoreConfig;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared state behind every `KvStore` clone.
pub(crate) struct StoreInner {
    /// Authoritative in-memory mapping.
    pub(crate) data: RwLock<Snapshot>,
    /// Where snapshots go.
    pub(crate) backend: Box<dyn SnapshotBackend>,
    /// Serializes saves so a later save never writes older state.
    pub(crate) save_lock: tokio::sync::Mutex<()>,
    /// Set when the last save failed, cleared by the next successful one.
    pub(crate) unsaved: AtomicBool,
}

/// Process-local JSON key-value store.
///
/// # Thread Safety
///
/// `KvStore` is `Clone` and can be shared across tasks and threads. All
/// mutations are applied under one write lock, so concurrent
/// read-modify-write through [`update`](Self::update) never loses updates.
///
/// # Example
///
/// ```ignore
/// use reelkv::services::kv::KvStore;
/// use serde_json::json;
///
/// let store = KvStore::file("/var/lib/reel/db.json").await;
/// store.set("video:1", json!({"title": "A", "views": 0})).await;
///
/// for (key, video) in store.scan_prefix("video:") {
///     println!("{key}: {video}");
/// }
/// ```
#[derive(Clone)]
pub struct KvStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl KvStore {
    /// Creates a store for the given configuration.
    ///
    /// Uses a [`FileBackend`] at `config.snapshot_path` when `persist` is
    /// set, and a [`MemoryBackend`] otherwise.
    pub async fn open(config: &StoreConfig) -> Self {
        if config.persist {
            Self::file(&config.snapshot_path).await
        } else {
            Self::memory()
        }
    }

    /// Creates a store backed by the JSON snapshot at `path`.
    ///
    /// A missing or unreadable snapshot yields an empty store.
    pub async fn file<P: AsRef<Path>>(path: P) -> Self {
        Self::custom(FileBackend::new(path)).await
    }

    /// Creates an empty store that never persists.
    pub fn memory() -> Self {
        Self::with_snapshot(Box::new(MemoryBackend::new()), Snapshot::new())
    }

    /// Creates a store with a custom backend, loading its last snapshot.
    pub async fn custom<B: SnapshotBackend>(backend: B) -> Self {
        Self::from_boxed(Box::new(backend)).await
    }

    /// Creates a store from a boxed backend, loading its last snapshot.
    pub async fn from_boxed(backend: Box<dyn SnapshotBackend>) -> Self {
        let snapshot = match backend.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    backend = %backend.describe(),
                    entries = snapshot.len(),
                    "Loaded snapshot"
                );
                snapshot
            },
            Ok(None) => {
                tracing::info!(
                    backend = %backend.describe(),
                    "No snapshot found, starting empty"
                );
                Snapshot::new()
            },
            Err(e) => {
                tracing::warn!(
                    backend = %backend.describe(),
                    error = %e,
                    "Failed to load snapshot, starting empty"
                );
                Snapshot::new()
            },
        };

        Self::with_snapshot(backend, snapshot)
    }

    fn with_snapshot(backend: Box<dyn SnapshotBackend>, snapshot: Snapshot) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                data: RwLock::new(snapshot),
                backend,
                save_lock: tokio::sync::Mutex::new(()),
                unsaved: AtomicBool::new(false),
            }),
        }
    }

    /// Whether mutations are written to durable storage.
    pub fn is_persistent(&self) -> bool {
        self.inner.backend.is_persistent()
    }

    /// Description of the backend, for logs and CLI output.
    pub fn backend_name(&self) -> String {
        self.inner.backend.describe()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Retrieves a value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.data.read().get(key).cloned()
    }

    /// Retrieves several values at once, in input order.
    ///
    /// The result has one slot per input key; duplicates are allowed.
    pub fn get_many<I, K>(&self, keys: I) -> Vec<Option<Value>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let data = self.inner.data.read();
        keys.into_iter()
            .map(|key| data.get(key.as_ref()).cloned())
            .collect()
    }

    /// Checks if a key exists.
    pub fn exists(&self, key: &str) -> bool {
        self.inner.data.read().contains_key(key)
    }

    /// Returns every entry whose key starts with `prefix`, in key order.
    ///
    /// An empty prefix matches everything.
    pub fn scan_prefix(&self, prefix: &str) -> Vec<(String, Value)> {
        let data = self.inner.data.read();
        data.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Lists keys, optionally filtered by prefix.
    pub fn keys(&self, prefix: Option<&str>) -> Vec<String> {
        let data = self.inner.data.read();
        let prefix = prefix.unwrap_or("");
        data.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.data.read().is_empty()
    }

    /// Counts keys per entity (the segment before the first `:`).
    pub fn entity_counts(&self) -> BTreeMap<String, usize> {
        let data = self.inner.data.read();
        let mut counts = BTreeMap::new();
        for key in data.keys() {
            *counts.entry(keys::entity_of(key).to_string()).or_insert(0) += 1;
        }
        counts
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Stores a value, replacing any previous one. Last write wins.
    pub async fn set(&self, key: impl Into<String>, value: Value) {
        self.inner.data.write().insert(key.into(), value);
        self.persist().await;
    }

    /// Stores several values, then persists once.
    pub async fn set_many<I, K>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        {
            let mut data = self.inner.data.write();
            for (key, value) in pairs {
                data.insert(key.into(), value);
            }
        }
        self.persist().await;
    }

    /// Deletes a key.
    ///
    /// Returns `true` if the key existed. Deleting a missing key is a no-op.
    pub async fn delete(&self, key: &str) -> bool {
        let removed = self.inner.data.write().remove(key).is_some();
        self.persist().await;
        removed
    }

    /// Deletes several keys, then persists once.
    ///
    /// Returns how many of them existed.
    pub async fn delete_many<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let removed = {
            let mut data = self.inner.data.write();
            keys.into_iter()
                .filter(|key| data.remove(key.as_ref()).is_some())
                .count()
        };
        self.persist().await;
        removed
    }

    /// Atomically replaces the value at `key` with `f(current)`.
    ///
    /// Returning `Some` from `f` stores the value, `None` deletes the key.
    /// The closure runs under the write lock, so it must not block.
    ///
    /// Returns the value written, if any.
    ///
    /// # Example
    ///
    /// ```ignore
    /// store.update("video:1", |video| {
    ///     let mut video = video.cloned()?;
    ///     let views = video["views"].as_u64().unwrap_or(0);
    ///     video["views"] = (views + 1).into();
    ///     Some(video)
    /// }).await;
    /// ```
    pub async fn update<F>(&self, key: &str, f: F) -> Option<Value>
    where
        F: FnOnce(Option<&Value>) -> Option<Value>,
    {
        let written = {
            let mut data = self.inner.data.write();
            match f(data.get(key)) {
                Some(value) => {
                    data.insert(key.to_string(), value.clone());
                    Some(value)
                },
                None => {
                    data.remove(key);
                    None
                },
            }
        };
        self.persist().await;
        written
    }

    /// Appends `item` to the JSON array at `key` unless already present.
    ///
    /// A missing key starts a new array; a non-array value is replaced.
    /// Returns `true` if the list changed.
    pub async fn push_to_list(&self, key: &str, item: Value) -> bool {
        let changed = {
            let mut data = self.inner.data.write();
            let mut items = match data.remove(key) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            let changed = !items.contains(&item);
            if changed {
                items.push(item);
            }
            data.insert(key.to_string(), Value::Array(items));
            changed
        };
        if changed {
            self.persist().await;
        }
        changed
    }

    /// Removes every occurrence of `item` from the JSON array at `key`.
    ///
    /// Missing keys and non-array values are left untouched.
    /// Returns `true` if the list changed.
    pub async fn remove_from_list(&self, key: &str, item: &Value) -> bool {
        let changed = {
            let mut data = self.inner.data.write();
            match data.get_mut(key) {
                Some(Value::Array(items)) => {
                    let before = items.len();
                    items.retain(|existing| existing != item);
                    items.len() != before
                },
                _ => false,
            }
        };
        if changed {
            self.persist().await;
        }
        changed
    }

    /// Removes every key, then persists.
    pub async fn clear(&self) {
        self.inner.data.write().clear();
        self.persist().await;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Writes the current mapping through the backend.
    ///
    /// Saves are serialized: the mapping is copied only after any earlier
    /// save has finished, so snapshots on disk never go backwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or written. The
    /// in-memory state is unaffected either way.
    pub async fn flush(&self) -> Result<()> {
        if !self.is_persistent() {
            return Ok(());
        }

        let _guard = self.inner.save_lock.lock().await;
        let snapshot = self.inner.data.read().clone();
        if let Err(e) = self.inner.backend.save(&snapshot).await {
            self.inner.unsaved.store(true, Ordering::Release);
            return Err(e);
        }
        self.inner.unsaved.store(false, Ordering::Release);

        tracing::debug!(
            backend = %self.inner.backend.describe(),
            entries = snapshot.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Returns true if the last save attempt failed, so the backend is
    /// behind the in-memory mapping.
    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.unsaved.load(Ordering::Acquire)
    }

    /// Flush after a mutation; failures are logged, never returned.
    async fn persist(&self) {
        if let Err(e) = self.flush().await {
            tracing::warn!(
                backend = %self.inner.backend.describe(),
                error = %e,
                "Failed to save snapshot, keeping in-memory state"
            );
        }
    }

    /// Final flush before the process exits.
    pub async fn shutdown(&self) {
        match self.flush().await {
            Ok(()) => tracing::info!(entries = self.len(), "Snapshot saved on shutdown"),
            Err(e) => tracing::warn!(error = %e, "Failed to save snapshot on shutdown"),
        }
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvStore")
            .field("backend", &self.inner.backend.describe())
            .field("entries", &self.len())
            .finish()
    }
}
