//! The user's own lists: favorites and continue-watching

use crate::models::ContinueWatchingEntry;
use crate::storage::{KeyValueStore, LocalLibraryStore};

/// Maximum continue-watching entries kept on device
pub const CONTINUE_WATCHING_CAP: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoriteSet {
    ids: Vec<String>,
}

impl FavoriteSet {
    pub fn from_ids(ids: Vec<String>) -> Self {
        Self { ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|f| f == id)
    }

    /// Add or remove `id`; returns true when it is now a favorite
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.ids.retain(|f| f != id);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Most-recent-first access history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinueWatching {
    entries: Vec<ContinueWatchingEntry>,
}

impl ContinueWatching {
    pub fn from_entries(mut entries: Vec<ContinueWatchingEntry>) -> Self {
        entries.truncate(CONTINUE_WATCHING_CAP);
        Self { entries }
    }

    pub fn record(&mut self, movie_id: &str, timestamp_ms: i64) {
        // Remove if already in list (to move to top)
        self.entries.retain(|e| e.movie_id != movie_id);
        self.entries.insert(
            0,
            ContinueWatchingEntry {
                movie_id: movie_id.to_string(),
                timestamp: timestamp_ms,
            },
        );
        self.entries.truncate(CONTINUE_WATCHING_CAP);
    }

    pub fn entries(&self) -> &[ContinueWatchingEntry] {
        &self.entries
    }
}

/// In-memory mirror of the persisted lists; every mutation writes through
#[derive(Debug)]
pub struct UserLibrary<S> {
    store: LocalLibraryStore<S>,
    favorites: FavoriteSet,
    continue_watching: ContinueWatching,
    favorites_rev: u64,
    continue_rev: u64,
}

impl<S: KeyValueStore> UserLibrary<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: LocalLibraryStore::new(store),
            favorites: FavoriteSet::default(),
            continue_watching: ContinueWatching::default(),
            favorites_rev: 0,
            continue_rev: 0,
        }
    }

    /// Replace in-memory state with what the device has stored
    pub fn load(&mut self) {
        self.favorites = FavoriteSet::from_ids(self.store.load_favorites());
        self.continue_watching = ContinueWatching::from_entries(self.store.load_continue_watching());
        self.favorites_rev += 1;
        self.continue_rev += 1;
        log::info!(
            "Loaded {} favorites, {} continue-watching entries",
            self.favorites.len(),
            self.continue_watching.entries().len()
        );
    }

    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let added = self.favorites.toggle(id);
        self.favorites_rev += 1;
        if let Err(e) = self.store.save_favorites(self.favorites.ids()) {
            log::warn!("Failed to persist favorites: {}", e);
        }
        added
    }

    pub fn record_watch(&mut self, movie_id: &str, timestamp_ms: i64) {
        self.continue_watching.record(movie_id, timestamp_ms);
        self.continue_rev += 1;
        if let Err(e) = self.store.save_continue_watching(self.continue_watching.entries()) {
            log::warn!("Failed to persist continue watching: {}", e);
        }
    }

    pub fn favorites(&self) -> &FavoriteSet {
        &self.favorites
    }

    pub fn continue_watching(&self) -> &[ContinueWatchingEntry] {
        self.continue_watching.entries()
    }

    pub fn favorites_revision(&self) -> u64 {
        self.favorites_rev
    }

    pub fn continue_revision(&self) -> u64 {
        self.continue_rev
    }

    pub fn store(&self) -> &LocalLibraryStore<S> {
        &self.store
    }
}
