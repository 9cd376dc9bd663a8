//! View derivation
//!
//! Pure functions that turn the raw catalog plus the user's lists into the
//! collections the home, favorites and search screens show. [`ViewCache`]
//! memoizes them against collection revisions.

use std::collections::HashMap;

use crate::catalog::CatalogSync;
use crate::library::FavoriteSet;
use crate::models::{BannerItem, Category, ContinueWatchingEntry, Movie, StoryCard, StoryItem};

/// Banner fallback: at most this many featured movies
pub const BANNER_FALLBACK_CAP: usize = 5;
/// Banner fallback: ratings above this count as featured
pub const BANNER_RATING_THRESHOLD: f64 = 8.5;
/// Trending fallback: top-rated count
pub const TRENDING_FALLBACK_CAP: usize = 10;
/// Story fallback: newest movies shown when no stories are configured
pub const STORY_FALLBACK_COUNT: usize = 4;
/// Story rail shows at most this many cards
pub const STORY_RAIL_DISPLAY_CAP: usize = 8;
/// Continue-watching row shows at most this many cards
pub const CONTINUE_WATCHING_DISPLAY_CAP: usize = 5;

/// Case-insensitive substring check without allocation
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() { return true; }
    if needle.len() > haystack.len() { return false; }

    haystack.as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

fn index_by_id(movies: &[Movie]) -> HashMap<&str, &Movie> {
    let mut index = HashMap::with_capacity(movies.len());
    for m in movies {
        // First match wins, like a linear find
        index.entry(m.id.as_str()).or_insert(m);
    }
    index
}

/// Rotating header sequence.
///
/// Active banner entries map to their movies (unresolved ones are dropped)
/// with the entry's image as display override. Without any active entry,
/// falls back to Exclusive or highly rated movies.
pub fn banner_sequence(movies: &[Movie], banners: &[BannerItem]) -> Vec<Movie> {
    let active: Vec<&BannerItem> = banners.iter().filter(|b| b.is_active).collect();

    if !active.is_empty() {
        let index = index_by_id(movies);
        return active
            .into_iter()
            .filter_map(|b| {
                let movie = index.get(b.movie_id.as_str())?;
                let image = b
                    .image
                    .as_deref()
                    .filter(|i| !i.is_empty())
                    .unwrap_or(&movie.thumbnail);
                Some(Movie {
                    banner_thumbnail: Some(image.to_string()),
                    ..(*movie).clone()
                })
            })
            .collect();
    }

    movies
        .iter()
        .filter(|m| m.category == Category::Exclusive || m.rating > BANNER_RATING_THRESHOLD)
        .take(BANNER_FALLBACK_CAP)
        .cloned()
        .collect()
}

/// Top-10 row: flagged movies by position, else the best rated
pub fn trending(movies: &[Movie]) -> Vec<Movie> {
    let mut flagged: Vec<Movie> = movies.iter().filter(|m| m.is_top10).cloned().collect();

    if flagged.is_empty() {
        let mut by_rating = movies.to_vec();
        by_rating.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        by_rating.truncate(TRENDING_FALLBACK_CAP);
        return by_rating;
    }

    flagged.sort_by_key(|m| m.effective_top10_position());
    flagged
}

/// Story cards: configured stories with badges, else the newest few movies
pub fn story_rail(movies: &[Movie], stories: &[StoryItem]) -> Vec<StoryCard> {
    if !stories.is_empty() {
        let index = index_by_id(movies);
        return stories
            .iter()
            .filter_map(|s| {
                let movie = index.get(s.movie_id.as_str())?;
                Some(StoryCard {
                    movie: (*movie).clone(),
                    badge: s.story_badge.clone().unwrap_or_default(),
                })
            })
            .collect();
    }

    movies
        .iter()
        .take(STORY_FALLBACK_COUNT)
        .map(|m| StoryCard {
            movie: m.clone(),
            badge: String::new(),
        })
        .collect()
}

/// Whether `movie` belongs in the grid for `selected`
pub fn category_matches(movie: &Movie, selected: &Category) -> bool {
    match selected {
        Category::All => true,
        Category::Exclusive => movie.category == Category::Exclusive || movie.is_exclusive,
        Category::Movies => {
            movie.category == Category::Movies
                || (movie.category == Category::Exclusive && !movie.has_episodes())
        }
        Category::WebSeries => movie.category == Category::WebSeries || movie.has_episodes(),
        Category::KDrama => movie.category == Category::KDrama || movie.category.is_legacy_korean_drama(),
        other => &movie.category == other,
    }
}

pub fn filter_by_category(movies: &[Movie], selected: &Category) -> Vec<Movie> {
    movies
        .iter()
        .filter(|m| category_matches(m, selected))
        .cloned()
        .collect()
}

/// Favorites in catalog order
pub fn favorites_view(movies: &[Movie], favorites: &FavoriteSet) -> Vec<Movie> {
    movies
        .iter()
        .filter(|m| favorites.contains(&m.id))
        .cloned()
        .collect()
}

/// Recently opened movies that still exist, newest first
pub fn continue_watching_view(movies: &[Movie], entries: &[ContinueWatchingEntry]) -> Vec<Movie> {
    let index = index_by_id(movies);
    entries
        .iter()
        .filter_map(|e| index.get(e.movie_id.as_str()).map(|m| (*m).clone()))
        .take(CONTINUE_WATCHING_DISPLAY_CAP)
        .collect()
}

/// Title or tag match, case-insensitive; empty query matches nothing
pub fn search(movies: &[Movie], query: &str) -> Vec<Movie> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    movies
        .iter()
        .filter(|m| contains_ignore_case(&m.title, query) || m.tags.iter().any(|t| contains_ignore_case(t, query)))
        .cloned()
        .collect()
}

/// Last computed value together with the inputs it came from
#[derive(Debug)]
pub struct Memo<K, V> {
    key: Option<K>,
    value: Option<V>,
    computes: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            key: None,
            value: None,
            computes: 0,
        }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    /// Cached value for `key`, recomputing only when the key changed
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
        if self.key.as_ref() != Some(&key) {
            self.value = None;
            self.key = Some(key);
        }
        let computes = &mut self.computes;
        self.value.get_or_insert_with(|| {
            *computes += 1;
            compute()
        })
    }

    /// How many times the value has been computed
    pub fn computes(&self) -> u64 {
        self.computes
    }
}

/// Memoized derivations keyed by the revisions of their inputs
#[derive(Debug, Default)]
pub struct ViewCache {
    banners: Memo<(u64, u64), Vec<Movie>>,
    trending: Memo<u64, Vec<Movie>>,
    stories: Memo<(u64, u64), Vec<StoryCard>>,
    filtered: Memo<(u64, Category), Vec<Movie>>,
    favorites: Memo<(u64, u64), Vec<Movie>>,
    continue_watching: Memo<(u64, u64), Vec<Movie>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn banners(&mut self, catalog: &CatalogSync) -> &[Movie] {
        let rev = catalog.revisions();
        self.banners.get_or_compute((rev.movies, rev.banners), || {
            let seq = banner_sequence(catalog.movies(), catalog.banners());
            log::debug!("Banner sequence recomputed: {} entries", seq.len());
            seq
        })
    }

    /// Changes exactly when the banner sequence has been recomputed
    pub fn banner_revision(&mut self, catalog: &CatalogSync) -> u64 {
        self.banners(catalog);
        self.banners.computes()
    }

    pub fn trending(&mut self, catalog: &CatalogSync) -> &[Movie] {
        self.trending
            .get_or_compute(catalog.revisions().movies, || trending(catalog.movies()))
    }

    pub fn stories(&mut self, catalog: &CatalogSync) -> &[StoryCard] {
        let rev = catalog.revisions();
        self.stories.get_or_compute((rev.movies, rev.stories), || {
            story_rail(catalog.movies(), catalog.stories())
        })
    }

    /// Full category-filtered list, before pagination
    pub fn filtered(&mut self, catalog: &CatalogSync, category: &Category) -> &[Movie] {
        self.filtered
            .get_or_compute((catalog.revisions().movies, category.clone()), || {
                filter_by_category(catalog.movies(), category)
            })
    }

    pub fn favorites(&mut self, catalog: &CatalogSync, favorites: &FavoriteSet, favorites_rev: u64) -> &[Movie] {
        self.favorites
            .get_or_compute((catalog.revisions().movies, favorites_rev), || {
                favorites_view(catalog.movies(), favorites)
            })
    }

    pub fn continue_watching(
        &mut self,
        catalog: &CatalogSync,
        entries: &[ContinueWatchingEntry],
        continue_rev: u64,
    ) -> &[Movie] {
        self.continue_watching
            .get_or_compute((catalog.revisions().movies, continue_rev), || {
                continue_watching_view(catalog.movies(), entries)
            })
    }
}

#[cfg(test)]
#[path = "views_tests.rs"]
mod tests;
