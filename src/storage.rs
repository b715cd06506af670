//! Local persistent key-value storage. Values are strings; an absent key means
//! "use the default".

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StorageError;

pub const KEY_LOVE_COUNT: &str = "loveCount";
pub const KEY_NO_CLICK_COUNT: &str = "noClickCount";
pub const KEY_LEADERBOARD: &str = "leaderboard";
pub const KEY_USER_IDENTITY: &str = "userIdentity";
/// Session-storage flag set after a successful login.
pub const KEY_AUTHENTICATED: &str = "authenticated";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Store handle shared by every component of one page.
pub type SharedStore = Rc<dyn KeyValueStore>;

/// Read a counter, treating absent or unparsable values as zero.
pub fn read_count(store: &dyn KeyValueStore, key: &str) -> u64 {
    match store.get(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                log::warn!("stored '{key}' is not a count ({raw:?}), using 0");
                0
            }
        },
        None => 0,
    }
}

/// Write a counter. Failures are logged and otherwise ignored: the in-memory
/// value stays authoritative for the session.
pub fn write_count(store: &dyn KeyValueStore, key: &str, value: u64) {
    if let Err(err) = store.set(key, &value.to_string()) {
        log::error!("could not persist '{key}': {err}");
    }
}

/// In-memory store. Clones share the same map, so a second handle behaves like
/// the same browser profile after a reload.
#[derive(Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Browser `localStorage` / `sessionStorage`.
#[derive(Clone)]
pub struct BrowserStorage {
    inner: web_sys::Storage,
}

impl BrowserStorage {
    pub fn local() -> Result<Self, StorageError> {
        let win = web_sys::window().ok_or(StorageError::Unavailable)?;
        let inner = win
            .local_storage()
            .ok()
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { inner })
    }

    pub fn session() -> Result<Self, StorageError> {
        let win = web_sys::window().ok_or(StorageError::Unavailable)?;
        let inner = win
            .session_storage()
            .ok()
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { inner })
    }
}

fn js_reason(err: wasm_bindgen::JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .set_item(key, value)
            .map_err(|err| StorageError::WriteRejected { key: key.to_string(), reason: js_reason(err) })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner
            .remove_item(key)
            .map_err(|err| StorageError::WriteRejected { key: key.to_string(), reason: js_reason(err) })
    }
}

/// Local store for the page: `localStorage` when the browser grants it,
/// otherwise a throwaway in-memory map so the page still works.
pub fn local_or_memory() -> SharedStore {
    match BrowserStorage::local() {
        Ok(store) => Rc::new(store),
        Err(err) => {
            log::warn!("{err}; counters will not survive a reload");
            Rc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_default_to_zero() {
        let store = MemoryStore::new();
        assert_eq!(read_count(&store, KEY_LOVE_COUNT), 0);
        store.set(KEY_LOVE_COUNT, "garbage").unwrap();
        assert_eq!(read_count(&store, KEY_LOVE_COUNT), 0);
        store.set(KEY_LOVE_COUNT, " 7 ").unwrap();
        assert_eq!(read_count(&store, KEY_LOVE_COUNT), 7);
    }

    #[test]
    fn memory_store_clones_share_items() {
        let a = MemoryStore::new();
        let b = a.clone();
        write_count(&a, KEY_NO_CLICK_COUNT, 3);
        assert_eq!(b.get(KEY_NO_CLICK_COUNT).as_deref(), Some("3"));
        b.remove(KEY_NO_CLICK_COUNT).unwrap();
        assert!(a.is_empty());
    }
}
