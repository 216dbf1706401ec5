//! Key-value store service with snapshot persistence.
//!
//! Keeps arbitrary JSON documents in memory, keyed by string, and writes the
//! whole mapping to a single JSON snapshot after every mutation and on a
//! timer. Two backends cover the two deployment modes:
//!
//! - **FileBackend**: durable to a local snapshot file (default)
//! - **MemoryBackend**: in-memory only, every restart starts empty
//!
//! Prefix scans stand in for secondary indexes; see [`keys`] for the naming
//! conventions callers use.
//!
//! # Example
//!
//! ```ignore
//! use reelkv::services::kv::{KvStore, keys};
//! use serde_json::json;
//!
//! let store = KvStore::file("~/.reelkv/db.json").await;
//! store.set(keys::record_key("video", "1"), json!({"title": "A"})).await;
//! store.push_to_list(&keys::list_key("video", "alice"), json!("1")).await;
//!
//! let videos = store.scan_prefix(&keys::entity_prefix("video"));
//! ```

mod autosave;
mod backend;
mod file;
pub mod keys;
mod memory;
mod store;
mod types;


// Re-export the public API
pub use autosave::AutosaveHandle;
pub use backend::SnapshotBackend;
pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use store::KvStore;
pub use types::{Snapshot, SnapshotError};
