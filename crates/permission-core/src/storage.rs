//! Persisted settings storage
//!
//! A small key-value abstraction standing in for the platform's user-defaults
//! store. Values are opaque bytes; typed records are layered on top in
//! [`crate::record`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::{PermissionError, Result};

// ----------------------------------------------------------------------------
// Storage Trait
// ----------------------------------------------------------------------------

/// Key-value storage for persisted permission state
pub trait SettingsStore: Send {
    /// Store a value under a key, replacing any previous value
    fn store(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Retrieve a value by key
    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a value by key
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Check if storage is available and accessible
    fn is_available(&self) -> bool;
}

// ----------------------------------------------------------------------------
// Memory Storage Implementation
// ----------------------------------------------------------------------------

/// In-memory storage for tests and ephemeral sessions
///
/// Clones share the same backing map, so a test can keep a handle while the
/// adapter owns another.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    available: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(BTreeMap::new())),
            available: true,
        }
    }

    /// A store that rejects every operation
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(PermissionError::StorageUnavailable)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemoryStore {
    fn store(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.ensure_available()?;
        self.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_available()?;
        Ok(self.lock().get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.ensure_available()?;
        self.lock().remove(key);
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

// ----------------------------------------------------------------------------
// File Storage Implementation
// ----------------------------------------------------------------------------

/// JSON file storage with hex-encoded values
///
/// The whole map is rewritten on every change through a temporary file and a
/// rename, so a crash never leaves a half-written settings file behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or lazily create) the settings file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                PermissionError::storage_error(format!(
                    "Failed to read settings file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened settings file {} ({} keys)", path.display(), data.len());
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` to disk; the in-memory map is only replaced on success
    fn commit(&mut self, data: BTreeMap<String, String>) -> Result<()> {
        self.flush(&data)?;
        self.data = data;
        Ok(())
    }

    fn flush(&self, data: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(data)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents).map_err(|e| {
            PermissionError::storage_error(format!(
                "Failed to write settings file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn store(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut data = self.data.clone();
        data.insert(key.to_string(), hex::encode(value));
        self.commit(data)
    }

    fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.data
            .get(key)
            .map(|encoded| {
                hex::decode(encoded).map_err(|e| {
                    PermissionError::storage_error(format!("Corrupt value for '{}': {}", key, e))
                })
            })
            .transpose()
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        if !self.data.contains_key(key) {
            return Ok(());
        }
        let mut data = self.data.clone();
        data.remove(key);
        self.commit(data)
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.is_available());

        store.store("key", vec![1, 2, 3]).unwrap();
        assert_eq!(store.retrieve("key").unwrap(), Some(vec![1, 2, 3]));

        store.delete("key").unwrap();
        assert_eq!(store.retrieve("key").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_clones_share_data() {
        let mut store = MemoryStore::new();
        let observer = store.clone();

        store.store("shared", vec![7]).unwrap();
        assert_eq!(observer.retrieve("shared").unwrap(), Some(vec![7]));
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn test_unavailable_store_rejects_operations() {
        let mut store = MemoryStore::unavailable();
        assert!(!store.is_available());
        assert!(matches!(
            store.store("key", vec![1]),
            Err(PermissionError::StorageUnavailable)
        ));
        assert!(store.retrieve("key").is_err());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        {
            let mut store = FileStore::open(&path).unwrap();
            store.store("permission.bluetooth", b"{}".to_vec()).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.retrieve("permission.bluetooth").unwrap(),
            Some(b"{}".to_vec())
        );
    }

    #[test]
    fn test_file_store_delete_missing_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = FileStore::open(&path).unwrap();
        store.delete("missing").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_failed_write_leaves_map_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        // The parent "directory" is a regular file, so every flush fails
        let mut store = FileStore::open(blocker.join("settings.json")).unwrap();
        assert!(store.store("permission.bluetooth", b"{}".to_vec()).is_err());
        assert_eq!(store.retrieve("permission.bluetooth").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"key": "not-hex"}"#).unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.retrieve("key").is_err());
    }
}
