//! Key/value persistence for saves and preferences
//!
//! Features:
//! - Synchronous string-keyed store behind the [`Storage`] trait
//! - JSON records via serde
//! - Malformed or missing data falls back to defaults, never to an error the
//!   player sees

#[cfg(target_arch = "wasm32")]
pub mod local;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage is not available")]
    Unavailable,
    #[error("write to '{key}' failed: {reason}")]
    Write { key: String, reason: String },
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

/// A synchronous string key/value store (LocalStorage on the web)
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
}

/// In-memory storage for native runs and tests. Counts writes per key.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    writes: BTreeMap<String, usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a raw value without counting it as a write
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }

    pub fn writes(&self, key: &str) -> usize {
        self.writes.get(key).copied().unwrap_or(0)
    }

    pub fn total_writes(&self) -> usize {
        self.writes.values().sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.items.insert(key.to_string(), value.to_string());
        *self.writes.entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

/// Shared handle to the arcade's storage.
///
/// Cloning is cheap; every component that persists (menu, score boards,
/// settings) holds its own clone. Single-threaded by construction.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<dyn Storage>>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    pub fn new<S: Storage + 'static>(storage: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(storage)),
        }
    }

    /// Wrap storage the caller keeps a handle to (tests inspect writes this way)
    pub fn from_shared(inner: Rc<RefCell<dyn Storage>>) -> Self {
        Self { inner }
    }

    /// Fresh in-memory store
    pub fn memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().get_item(key)
    }

    /// Load a record; `Ok(None)` when the key is absent
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistError> {
        match self.get_raw(key) {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Load a record, treating malformed data as absent
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Ignoring saved data for '{}': {}", key, e);
                None
            }
        }
    }

    pub fn try_save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistError> {
        let json = serde_json::to_string(value)?;
        self.inner.borrow_mut().set_item(key, &json)
    }

    /// Save a record; failures are logged and otherwise ignored
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        match self.try_save(key, value) {
            Ok(()) => log::debug!("Saved '{}'", key),
            Err(e) => log::warn!("Could not save '{}': {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        value: u32,
    }

    #[test]
    fn test_round_trip_counts_writes() {
        let mem = Rc::new(RefCell::new(MemoryStorage::new()));
        let store = Store::from_shared(mem.clone());
        store.save("k", &Record { value: 7 });
        assert_eq!(store.load::<Record>("k"), Some(Record { value: 7 }));
        assert_eq!(mem.borrow().writes("k"), 1);
    }

    #[test]
    fn test_garbage_loads_as_none() {
        let store = Store::new(MemoryStorage::new().with_item("k", "{not json"));
        assert!(store.try_load::<Record>("k").is_err());
        assert_eq!(store.load::<Record>("k"), None);
        assert_eq!(store.load::<Record>("missing"), None);
    }
}
