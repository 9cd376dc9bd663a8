//! Catalog synchronization
//!
//! Holds the raw remote collections and keeps them in step with the store's
//! snapshots. Every applied snapshot replaces the collection wholesale.

use std::collections::HashMap;
use std::sync::mpsc::Sender;

use crate::error::StoreError;
use crate::models::{AppSettings, BannerItem, Movie, StoryItem};
use crate::remote::{CatalogStore, Snapshot, Source, StoreEvent, Subscription};

/// Per-collection change counters, bumped on every replacement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revisions {
    pub movies: u64,
    pub settings: u64,
    pub banners: u64,
    pub stories: u64,
}

#[derive(Debug)]
pub struct CatalogSync {
    movies: Vec<Movie>,
    settings: AppSettings,
    banners: Vec<BannerItem>,
    stories: Vec<StoryItem>,
    revisions: Revisions,
    subscriptions: Vec<Subscription>,
}

impl Default for CatalogSync {
    fn default() -> Self {
        Self::new(AppSettings::default())
    }
}

impl CatalogSync {
    /// `settings` are the defaults held until the settings document arrives
    pub fn new(settings: AppSettings) -> Self {
        Self {
            movies: Vec::new(),
            settings,
            banners: Vec::new(),
            stories: Vec::new(),
            revisions: Revisions::default(),
            subscriptions: Vec::new(),
        }
    }

    /// Open the four live subscriptions.
    ///
    /// If any of them cannot be opened, the ones already opened are released
    /// before the error is returned.
    pub fn activate<C: CatalogStore + ?Sized>(
        &mut self,
        store: &C,
        sink: Sender<StoreEvent>,
    ) -> Result<(), StoreError> {
        if self.is_active() {
            return Ok(());
        }

        let mut opened = Vec::with_capacity(Source::ALL.len());
        for source in Source::ALL {
            match store.subscribe(source, sink.clone()) {
                Ok(sub) => opened.push(sub),
                Err(e) => {
                    log::warn!("Failed to subscribe to {}: {}", source.path(), e);
                    for sub in &opened {
                        sub.unsubscribe();
                    }
                    return Err(e);
                }
            }
        }

        self.subscriptions = opened;
        log::info!("Catalog sync active ({} subscriptions)", self.subscriptions.len());
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Release every subscription; safe to call repeatedly
    pub fn deactivate(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for sub in self.subscriptions.drain(..) {
            sub.unsubscribe();
        }
        log::info!("Catalog sync released");
    }

    /// Apply one store event. Returns the source whose data changed, if any.
    ///
    /// Events from subscriptions that are no longer live are dropped.
    pub fn apply(&mut self, event: StoreEvent) -> Option<Source> {
        let live = self
            .subscriptions
            .iter()
            .any(|s| s.id() == event.subscription && s.is_active());
        if !live {
            log::debug!("Dropping event from released subscription #{}", event.subscription);
            return None;
        }

        match event.result {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(e) => self.apply_error(event.source, &e),
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) -> Option<Source> {
        match snapshot {
            Snapshot::Movies(movies) => {
                let received = movies.len();
                self.movies = normalize_movies(movies);
                self.revisions.movies += 1;
                log::info!("Loaded {} movies ({} in snapshot)", self.movies.len(), received);
                Some(Source::Movies)
            }
            Snapshot::Settings(Some(settings)) => {
                self.settings = settings;
                self.revisions.settings += 1;
                log::debug!("Settings updated");
                Some(Source::Settings)
            }
            Snapshot::Settings(None) => {
                log::debug!("Settings document absent, keeping current values");
                None
            }
            Snapshot::Banners(banners) => {
                self.banners = banners.into_iter().filter(|b| b.is_active).collect();
                self.revisions.banners += 1;
                log::debug!("Loaded {} active banners", self.banners.len());
                Some(Source::Banners)
            }
            Snapshot::Stories(stories) => {
                self.stories = stories;
                self.revisions.stories += 1;
                log::debug!("Loaded {} stories", self.stories.len());
                Some(Source::Stories)
            }
        }
    }

    fn apply_error(&mut self, source: Source, error: &StoreError) -> Option<Source> {
        log::warn!("{} subscription failed: {}", source.path(), error);
        match source {
            Source::Movies => {
                self.movies.clear();
                self.revisions.movies += 1;
                Some(Source::Movies)
            }
            // Keep what we have
            Source::Settings | Source::Banners | Source::Stories => None,
        }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Active banner entries in query order
    pub fn banners(&self) -> &[BannerItem] {
        &self.banners
    }

    pub fn stories(&self) -> &[StoryItem] {
        &self.stories
    }

    pub fn revisions(&self) -> Revisions {
        self.revisions
    }

    pub fn find(&self, id: &str) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }
}

impl Drop for CatalogSync {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// De-duplicate by id and order newest first.
///
/// A repeated id keeps the position of its first occurrence and the fields of
/// its last. The sort is stable, and missing creation times count as 0.
pub fn normalize_movies(movies: Vec<Movie>) -> Vec<Movie> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(movies.len());
    let mut unique: Vec<Movie> = Vec::with_capacity(movies.len());

    for movie in movies {
        match index.get(&movie.id) {
            Some(&pos) => unique[pos] = movie,
            None => {
                index.insert(movie.id.clone(), unique.len());
                unique.push(movie);
            }
        }
    }

    unique.sort_by(|a, b| b.created_seconds().cmp(&a.created_seconds()));
    unique
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
