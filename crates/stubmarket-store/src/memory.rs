//! In-memory storage implementation.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::keys::StorageKey;
use crate::Storage;

/// Storage that lives only as long as the process.
///
/// Useful for tests and for sessions that should not touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(self.values.read().get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.values.write().insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        self.values.write().remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.get(StorageKey::Token).unwrap().is_none());

        storage.set(StorageKey::Token, "abc").unwrap();
        assert_eq!(storage.get(StorageKey::Token).unwrap().as_deref(), Some("abc"));

        storage.remove(StorageKey::Token).unwrap();
        assert!(storage.get(StorageKey::Token).unwrap().is_none());
    }

    #[test]
    fn set_overwrites() {
        let storage = MemoryStorage::new();
        storage.set(StorageKey::User, "alice").unwrap();
        storage.set(StorageKey::User, "bob").unwrap();
        assert_eq!(storage.get(StorageKey::User).unwrap().as_deref(), Some("bob"));
    }
}
