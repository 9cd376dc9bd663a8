//! On-device key/value storage for favorites and continue-watching

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::app_file;
use crate::error::StorageError;
use crate::models::ContinueWatchingEntry;

pub const FAVORITES_KEY: &str = "cine_favs";
pub const CONTINUE_WATCHING_KEY: &str = "cine_continue";

/// String key/value storage, the shape of a browser's local storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON object file holding every key, rewritten on each write
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileStore {
    /// Open the default store under the user's config directory
    pub fn open_default() -> Self {
        Self::open(app_file("storage.json"))
    }

    pub fn open(path: PathBuf) -> Self {
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable storage {}: {}", path.display(), e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, values }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value);
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Typed access to the two persisted lists
#[derive(Debug)]
pub struct LocalLibraryStore<S> {
    store: S,
}

impl<S: KeyValueStore> LocalLibraryStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn load_favorites(&self) -> Vec<String> {
        self.load_list(FAVORITES_KEY)
    }

    pub fn save_favorites(&mut self, favorites: &[String]) -> Result<(), StorageError> {
        self.save_list(FAVORITES_KEY, favorites)
    }

    pub fn load_continue_watching(&self) -> Vec<ContinueWatchingEntry> {
        self.load_list(CONTINUE_WATCHING_KEY)
    }

    pub fn save_continue_watching(
        &mut self,
        entries: &[ContinueWatchingEntry],
    ) -> Result<(), StorageError> {
        self.save_list(CONTINUE_WATCHING_KEY, entries)
    }

    // Absent or malformed values read as empty
    fn load_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.store.get(key) {
            Some(raw) if !raw.is_empty() => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed '{}' entry: {}", key, e);
                Vec::new()
            }),
            _ => Vec::new(),
        }
    }

    fn save_list<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items)?;
        self.store.set(key, json)
    }
}
