//! JSON snapshot file backend.
//!
//! Stores the whole mapping as one pretty-printed JSON object. Every save
//! rewrites the file in full: the new contents go to a temporary file in the
//! same directory, are synced, and are then renamed over the snapshot, so a
//! crash mid-write leaves the previous snapshot intact.

use super::backend::SnapshotBackend;
use super::types::{Result, Snapshot, SnapshotError};
use async_trait::async_trait;
use serde_json::Value;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File-backed snapshot storage.
///
/// `FileBackend` is `Clone`; clones share the same path. It provides no
/// locking against other processes writing the same file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: Arc<PathBuf>,
}

impl FileBackend {
    /// Creates a backend for the snapshot at `path`.
    ///
    /// Nothing is touched on disk until the first load or save.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        }
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Internal helper to read the snapshot synchronously.
    fn load_sync(&self) -> Result<Option<Snapshot>> {
        let path = self.path();

        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SnapshotError::io(path, e)),
        };

        let json: Value = serde_json::from_str(&data).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        match json {
            Value::Object(map) => Ok(Some(map.into_iter().collect())),
            _ => Err(SnapshotError::NotAnObject {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Internal helper to atomically replace the snapshot synchronously.
    fn save_sync(&self, contents: &[u8]) -> Result<()> {
        let path = self.path();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        fs::create_dir_all(dir).map_err(|e| SnapshotError::io(dir, e))?;

        // The replacement keeps the mode of the snapshot it replaces; a new
        // snapshot gets the mode an ordinary file write would give it.
        let existing = fs::metadata(path).ok().map(|meta| meta.permissions());

        let mut builder = tempfile::Builder::new();
        builder.prefix(".reelkv-").suffix(".tmp");
        if let Some(permissions) = existing.clone().or_else(default_permissions) {
            builder.permissions(permissions);
        }

        let mut tmp = builder
            .tempfile_in(dir)
            .map_err(|e| SnapshotError::io(dir, e))?;

        // Creation mode is masked by the umask.
        if let Some(permissions) = existing {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(|e| SnapshotError::io(tmp.path(), e))?;
        }

        tmp.write_all(contents)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| SnapshotError::io(tmp.path(), e))?;

        tmp.persist(path)
            .map_err(|e| SnapshotError::io(path, e.error))?;

        Ok(())
    }
}

/// Creation mode for a new snapshot, before the umask.
#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Encode a snapshot the way it is stored on disk.
pub(crate) fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut contents = serde_json::to_vec_pretty(snapshot).map_err(SnapshotError::Serialize)?;
    contents.push(b'\n');
    Ok(contents)
}

#[async_trait]
impl SnapshotBackend for FileBackend {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.load_sync())
            .await
            .map_err(|e| SnapshotError::Join(e.to_string()))?
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let contents = encode(snapshot)?;
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.save_sync(&contents))
            .await
            .map_err(|e| SnapshotError::Join(e.to_string()))?
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert("video:1".to_string(), json!({"title": "A", "views": 0}));
        snapshot.insert("user:alice".to_string(), json!({"name": "Alice"}));
        snapshot
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let backend = FileBackend::new(tmp.path().join("db.json"));

        assert!(backend.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let backend = FileBackend::new(tmp.path().join("db.json"));

        backend.save(&sample()).await.unwrap();
        let loaded = backend.load().await.unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn test_saved_file_is_pretty_json_object() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let backend = FileBackend::new(&path);

        backend.save(&sample()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"user:alice\""));
        assert!(text.ends_with('\n'));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert!(value.is_object());
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("deeper").join("db.json");
        let backend = FileBackend::new(&path);

        backend.save(&sample()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let backend = FileBackend::new(tmp.path().join("db.json"));

        backend.save(&sample()).await.unwrap();
        backend.save(&Snapshot::new()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["db.json".to_string()]);
    }

    #[tokio::test]
    async fn test_load_malformed_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "{ \"video:1\": ").unwrap();

        let err = FileBackend::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_load_non_object() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = FileBackend::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SnapshotError::NotAnObject { .. }));
    }

    #[tokio::test]
    async fn test_save_into_file_as_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let backend = FileBackend::new(blocker.join("db.json"));
        let err = backend.save(&sample()).await.unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_save_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        let backend = FileBackend::new(&path);
        backend.save(&sample()).await.unwrap();
        backend.save(&Snapshot::new()).await.unwrap();

        assert_eq!(mode(&path), 0o640);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_snapshot_mode_matches_plain_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let plain = tmp.path().join("plain.json");
        std::fs::write(&plain, "{}").unwrap();

        FileBackend::new(&path).save(&sample()).await.unwrap();

        assert_eq!(mode(&path), mode(&plain));
    }
}
