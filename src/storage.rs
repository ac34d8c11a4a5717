//! Namespaced JSON key-value storage.
//!
//! [`StorageBackend`] is the raw substrate (LMDB in production, see
//! [`AppDbState`](crate::local_db_state::AppDbState), or [`MemoryStore`] for
//! tests). [`StorageAdapter`] sits on top of it, prefixes every key with a
//! namespace and moves values in and out as JSON.
//!
//! ```rust
//! use workout_tracker_core::storage::{MemoryStore, StorageAdapter};
//!
//! let storage = StorageAdapter::new(MemoryStore::new(), "workout-tracker");
//! storage.set_item("greeting", &vec!["hello", "world"])?;
//!
//! let value: Option<Vec<String>> = storage.get_item("greeting")?;
//! assert_eq!(value, Some(vec!["hello".to_string(), "world".to_string()]));
//! # Ok::<(), workout_tracker_core::error::StorageError>(())
//! ```

use std::collections::BTreeMap;
use std::sync::RwLock;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StorageCause, StorageError};

/// A synchronous string-to-string store.
///
/// Each call replaces or removes a whole value in one step; implementations
/// must never leave a half-written value behind.
pub trait StorageBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Removes every key starting with `prefix` and returns how many were removed.
    fn clear_prefix(&self, prefix: &str) -> Result<usize, StorageError>;
}

/// In-process backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw view of the stored entries, keys included with their namespace.
    pub fn raw_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::with_cause("Failed to read memory store", StorageCause::Poisoned))?;
        Ok(entries.clone())
    }
}

impl StorageBackend for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::with_cause("Failed to get item from storage", StorageCause::Poisoned))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::with_cause("Failed to set item in storage", StorageCause::Poisoned))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::with_cause("Failed to remove item from storage", StorageCause::Poisoned))?;
        entries.remove(key);
        Ok(())
    }

    fn clear_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::with_cause("Failed to clear storage", StorageCause::Poisoned))?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }
}

/// JSON wrapper that keeps all of its keys under `"<namespace>:"`.
///
/// An empty namespace disables prefixing, in which case [`clear`](Self::clear)
/// removes every key of the backend.
pub struct StorageAdapter<B> {
    backend: B,
    prefix: String,
}

impl<B: StorageBackend> StorageAdapter<B> {
    pub fn new(backend: B, namespace: &str) -> Self {
        let prefix = if namespace.is_empty() {
            String::new()
        } else {
            format!("{namespace}:")
        };
        Self { backend, prefix }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn namespaced_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Returns the value stored under `key`, or `None` when absent.
    ///
    /// A stored JSON `null` reads back as `None` as well.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let full_key = self.namespaced_key(key);
        let Some(raw) = self.backend.read(&full_key)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<Option<T>>(&raw)
            .map_err(|e| StorageError::with_cause("Failed to get item from storage", e))
    }

    pub fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)
            .map_err(|e| StorageError::with_cause("Failed to set item in storage", e))?;
        let full_key = self.namespaced_key(key);
        debug!("Writing {} bytes under {}", json.len(), full_key);
        self.backend.write(&full_key, &json)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(&self.namespaced_key(key))
    }

    /// Removes only the keys that belong to this namespace.
    pub fn clear(&self) -> Result<usize, StorageError> {
        let removed = self.backend.clear_prefix(&self.prefix)?;
        debug!("Cleared {} keys with prefix {:?}", removed, self.prefix);
        Ok(removed)
    }
}
