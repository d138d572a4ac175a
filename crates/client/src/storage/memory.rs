//! In-memory storage implementation - used in tests and when no storage
//! path is configured.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyValueStorage, StorageError};

/// In-memory key-value storage.
///
/// Note: data is lost when the process exits, so carts and sessions do not
/// survive a restart with this backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned lock means a panic mid-insert on a plain HashMap; the
        // map itself is still structurally sound, so keep serving it.
        self.store
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let storage = MemoryStorage::new();
        storage.set("key1", "value1").unwrap();
        assert_eq!(storage.get("key1").unwrap(), Some("value1".to_owned()));
    }

    #[test]
    fn test_get_absent() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("missing").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let storage = MemoryStorage::new();
        storage.set("key1", "old").unwrap();
        storage.set("key1", "new").unwrap();
        assert_eq!(storage.get("key1").unwrap(), Some("new".to_owned()));
    }

    #[test]
    fn test_remove() {
        let storage = MemoryStorage::new();
        storage.set("key1", "value1").unwrap();
        storage.remove("key1").unwrap();
        assert_eq!(storage.get("key1").unwrap(), None);

        // Removing an absent key is fine.
        storage.remove("key1").unwrap();
    }
}
