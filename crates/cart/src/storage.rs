//! Key/value storage backends.
//!
//! The cart needs two stores: a durable one shared by every session of the
//! same origin, and an ephemeral per-session one. Both speak plain strings,
//! mirroring browser web storage.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::StorageError;

/// A string key/value store.
pub trait KeyValueStorage: Send + Sync + std::fmt::Debug {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
struct InMemoryStorageState {
    entries: HashMap<String, String>,
    fail_on_read: bool,
    fail_on_write: bool,
}

/// In-memory storage, used for session-scoped data and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
}

impl InMemoryStorage {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read fail, as if storage were disabled.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_read = fail;
    }

    /// Makes every subsequent write or removal fail, as if the quota were exceeded.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_write = fail;
    }

    /// Returns true if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(key)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        if state.fail_on_read {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        if state.fail_on_write {
            return Err(StorageError::Unavailable("storage quota exceeded".to_string()));
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        if state.fail_on_write {
            return Err(StorageError::Unavailable("storage quota exceeded".to_string()));
        }
        state.entries.remove(key);
        Ok(())
    }
}

/// Durable storage backed by a single JSON object on disk.
///
/// Every operation re-reads the file, so several processes sharing the same
/// file see each other's writes (last write wins). Writes go to a sibling
/// temporary file which is then renamed over the original.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStorage {
    /// Creates a store backed by the file at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        let mut entries = self.read_entries()?;
        f(&mut entries);
        self.write_entries(&entries)
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_set_get_remove() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        assert!(storage.contains("k"));

        storage.remove("k").unwrap();
        assert!(storage.is_empty());
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_in_memory_failure_injection() {
        let storage = InMemoryStorage::new();
        storage.set("k", "v").unwrap();

        storage.set_fail_on_write(true);
        assert!(storage.set("k", "w").is_err());
        assert!(storage.remove("k").is_err());
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

        storage.set_fail_on_read(true);
        assert!(matches!(
            storage.get("k"),
            Err(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn test_clones_share_entries() {
        let storage = InMemoryStorage::new();
        let other = storage.clone();
        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        let storage = JsonFileStorage::new(&path);
        assert_eq!(storage.get("cart").unwrap(), None);
        storage.set("cart", "[]").unwrap();
        storage.set("cart-version", "3").unwrap();

        let reopened = JsonFileStorage::new(&path);
        assert_eq!(reopened.get("cart").unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("cart-version").unwrap().as_deref(), Some("3"));

        reopened.remove("cart").unwrap();
        assert_eq!(storage.get("cart").unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = JsonFileStorage::new(&path);
        assert!(matches!(
            storage.get("cart"),
            Err(StorageError::Serialization(_))
        ));
    }
}
