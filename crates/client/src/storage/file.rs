//! File-backed storage implementation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{KeyValueStorage, StorageError};

/// Key-value storage persisted as a single JSON object file.
///
/// Stands in for the browser's `localStorage`: one file per storage scope,
/// rewritten in full on every write. There is no cross-process change
/// notification - two processes sharing one file diverge until one of them
/// re-hydrates. That mirrors the multi-tab behavior of the original
/// front-end and is an accepted limitation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open storage at `path`, loading any existing contents.
    ///
    /// A file that exists but does not parse as a JSON string map is treated
    /// as empty; the next write replaces it. Hydration must fail open, not
    /// crash the stores.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let map = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Storage file is malformed, starting empty"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    /// The file this storage persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.map
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Write the whole map to disk. Writes go through a sibling temp file
    /// and a rename so a crash mid-write never leaves a half-written map.
    fn flush(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let encoded = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.lock();
        map.insert(key.to_owned(), value.to_owned());
        self.flush(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.lock();
        if map.remove(key).is_some() {
            self.flush(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("peddler-storage-{name}-{}", std::process::id()));
        path
    }

    #[test]
    fn test_round_trip_across_instances() {
        let path = temp_path("round-trip");
        let _ = fs::remove_file(&path);

        let storage = FileStorage::open(&path).unwrap();
        storage.set("cart", "[]").unwrap();
        storage.set("authToken", "tok-123").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("cart").unwrap(), Some("[]".to_owned()));
        assert_eq!(
            reopened.get("authToken").unwrap(),
            Some("tok-123".to_owned())
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let path = temp_path("malformed");
        fs::write(&path, "not json at all {{{").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("cart").unwrap(), None);

        // The next write replaces the malformed file.
        storage.set("cart", "[]").unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("cart").unwrap(), Some("[]".to_owned()));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_remove_persists() {
        let path = temp_path("remove");
        let _ = fs::remove_file(&path);

        let storage = FileStorage::open(&path).unwrap();
        storage.set("authToken", "tok").unwrap();
        storage.remove("authToken").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("authToken").unwrap(), None);

        let _ = fs::remove_file(&path);
    }
}
