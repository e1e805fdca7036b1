//! Durable key/value storage for state that must outlive a full-page navigation.
//!
//! Only the PKCE code verifier goes here. Access tokens never touch durable storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::*;

use crate::error::{storage_error, Error, ErrorKind, StorageErrorKind};

/// Trait for string storage that survives the redirect round trip to the identity provider.
///
/// Implementations should be cheap to call and safe to share between tasks.
pub trait DurableStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Process-local storage, mostly useful for tests and embedded hosts.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object file.
///
/// Every write rewrites the whole file; the map is expected to hold a handful of entries.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Use `path` as the backing file. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>, Error> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                warn!("Failed to read storage file {}: {}", self.path.display(), e);
                return Err(Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::Storage(StorageErrorKind::ReadFailed),
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&contents).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Storage(StorageErrorKind::ReadFailed),
        })
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Storage(StorageErrorKind::WriteFailed),
            })?;
        }

        let contents = serde_json::to_string_pretty(map)
            .map_err(|_| storage_error(StorageErrorKind::WriteFailed, "Failed to encode storage map"))?;

        fs::write(&self.path, contents).map_err(|e| {
            warn!("Failed to write storage file {}: {}", self.path.display(), e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Storage(StorageErrorKind::WriteFailed),
            }
        })
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);

        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v2".to_string()));

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_clones_share_values() {
        let storage = MemoryStorage::new();
        let clone = storage.clone();
        storage.set("k", "v").unwrap();
        assert_eq!(clone.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_file_storage_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileStorage::new(&path).set("k", "v").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("k").unwrap(), Some("v".to_string()));
        assert_eq!(reopened.get("other").unwrap(), None);

        reopened.remove("k").unwrap();
        assert_eq!(FileStorage::new(&path).get("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.get("k").unwrap(), None);
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_file_storage_corrupt_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let result = FileStorage::new(&path).get("k");
        assert!(matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::Storage(StorageErrorKind::ReadFailed),
                ..
            })
        ));
    }
}
