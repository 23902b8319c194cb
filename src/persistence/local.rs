//! Browser LocalStorage backend

use super::{PersistError, Storage};

/// `window.localStorage`, looked up on each access
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        let storage = Self::storage().ok_or(PersistError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| PersistError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}
