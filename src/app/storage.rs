//! Typed JSON blobs in browser storage.
//!
//! [`Repository`] is the only place that parses stored values: a value that
//! fails to parse is removed and the caller falls back to its defaults.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::error::StorageError;

pub const GENERATION_STATUS_KEY: &str = "generationStatus";
pub const SELECTED_TAGS_KEY: &str = "selectedTagsData";
pub const UPLOAD_HISTORY_KEY: &str = "uploadHistory";
pub const LAST_WRITING_TYPE_KEY: &str = "lastWritingType";
pub const LAST_REQUEST_KEY: &str = "lastGenerationRequest";

pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

/// Process-local store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageArea {
    Local,
    Session,
}

/// `localStorage` or `sessionStorage`, or memory when neither can be opened
/// (private browsing, storage disabled).
#[derive(Clone, Debug)]
pub enum BrowserStore {
    Web(web_sys::Storage),
    Memory(MemoryStore),
}

impl BrowserStore {
    pub fn local() -> Self {
        Self::open(StorageArea::Local)
    }

    pub fn session() -> Self {
        Self::open(StorageArea::Session)
    }

    pub fn open(area: StorageArea) -> Self {
        match Self::web_storage(area) {
            Ok(storage) => BrowserStore::Web(storage),
            Err(err) => {
                log::warn!("{:?} storage: {}, keeping state in memory", area, err);
                BrowserStore::Memory(MemoryStore::new())
            }
        }
    }

    fn web_storage(area: StorageArea) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or(StorageError::Unavailable)?;
        let storage = match area {
            StorageArea::Local => window.local_storage(),
            StorageArea::Session => window.session_storage(),
        };
        storage.ok().flatten().ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for BrowserStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        match self {
            BrowserStore::Web(storage) => storage.get_item(key).ok().flatten(),
            BrowserStore::Memory(mem) => mem.get_raw(key),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        match self {
            BrowserStore::Web(storage) => storage.set_item(key, value).map_err(|e| StorageError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            }),
            BrowserStore::Memory(mem) => mem.set_raw(key, value),
        }
    }

    fn remove(&self, key: &str) {
        match self {
            BrowserStore::Web(storage) => {
                let _ = storage.remove_item(key);
            }
            BrowserStore::Memory(mem) => mem.remove(key),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Repository<S> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// `None` when the key is missing or held garbage (which is then removed).
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                let err = StorageError::Parse { key: key.to_string(), reason: e.to_string() };
                log::warn!("{}; discarding it", err);
                self.store.remove(key);
                None
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Write { key: key.to_string(), reason: e.to_string() })?;
        self.store.set_raw(key, &raw)
    }

    /// Like [`Repository::save`] but only logs a failure.
    pub fn save_or_warn<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.save(key, value) {
            log::warn!("{}", e);
        }
    }

    pub fn remove(&self, key: &str) {
        self.store.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::types::GenerationStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn saved_values_load_back() {
        let repo = Repository::new(MemoryStore::new());
        let status = GenerationStatus { is_generating: true, task_id: Some("t-9".into()), ..Default::default() };
        repo.save(GENERATION_STATUS_KEY, &status).unwrap();
        assert_eq!(repo.load::<GenerationStatus>(GENERATION_STATUS_KEY), Some(status));
    }

    #[test]
    fn corrupt_value_is_removed() {
        let store = MemoryStore::new();
        store.set_raw(GENERATION_STATUS_KEY, "{not json").unwrap();
        let repo = Repository::new(store.clone());
        assert_eq!(repo.load::<GenerationStatus>(GENERATION_STATUS_KEY), None);
        assert_eq!(store.get_raw(GENERATION_STATUS_KEY), None);
    }

    #[test]
    fn missing_key_is_none() {
        let repo = Repository::new(MemoryStore::new());
        assert_eq!(repo.load::<Vec<String>>(UPLOAD_HISTORY_KEY), None);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use wasm_bindgen_test::*;

    use super::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn session_storage_round_trip() {
        let store = BrowserStore::session();
        assert!(matches!(store, BrowserStore::Web(_)));
        let repo = Repository::new(store);
        repo.save(UPLOAD_HISTORY_KEY, &vec!["F1".to_string()]).unwrap();
        assert_eq!(repo.load::<Vec<String>>(UPLOAD_HISTORY_KEY), Some(vec!["F1".to_string()]));
        repo.remove(UPLOAD_HISTORY_KEY);
        assert_eq!(repo.load::<Vec<String>>(UPLOAD_HISTORY_KEY), None);
    }
}
