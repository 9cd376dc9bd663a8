//! Application controller
//!
//! Wires the catalog, the user's library, the derived views and the
//! interaction state machines together. Everything runs on the caller's
//! thread: store events are queued on a channel and applied by [`CineflixApp::pump`],
//! timers fire from [`CineflixApp::tick`].

use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::catalog::{CatalogSync, Revisions};
use crate::error::StoreError;
use crate::host::{HostBridge, ImpactStyle, NotificationKind};
use crate::interaction::{pick_random, BannerRotator, LoadingGate, NavVisibility, TapUnlock};
use crate::library::UserLibrary;
use crate::models::{AppSettings, Category, Movie, StoryCard, Tab, DEFAULT_CHANNEL_LINK};
use crate::paging::{GridPage, Pagination};
use crate::remote::{CatalogStore, StoreEvent};
use crate::storage::KeyValueStore;
use crate::views::{self, ViewCache, STORY_RAIL_DISPLAY_CAP};

/// Delay between closing a story and opening its details
pub const STORY_TO_DETAILS_DELAY: Duration = Duration::from_millis(300);
pub const HOST_THEME_COLOR: &str = "#000000";

pub const LOADING_CONTENT_TEXT: &str = "Loading Content...";
pub const NO_CONTENT_TEXT: &str = "No content found.";

/// Everything the home screen renders
#[derive(Debug, Clone, PartialEq)]
pub struct HomeView {
    pub banner: Option<Movie>,
    /// Banner override image, else the movie's thumbnail
    pub banner_image: Option<String>,
    pub banner_index: usize,
    pub banner_count: usize,
    pub trending: Vec<Movie>,
    pub continue_watching: Vec<Movie>,
    pub stories: Vec<StoryCard>,
    pub channel_link: String,
    pub notice_channel_link: Option<String>,
    pub category: Category,
    pub heading: String,
    pub grid: GridPage,
    /// Placeholder shown instead of an empty grid
    pub empty_text: Option<&'static str>,
}

/// Wall-clock milliseconds, the continue-watching timestamp unit
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn grid_heading(category: &Category) -> String {
    match category {
        Category::All => "Just Added".to_string(),
        other => format!("{} Collection", other),
    }
}

#[derive(Debug)]
pub struct CineflixApp<S, H> {
    catalog: CatalogSync,
    library: UserLibrary<S>,
    views: ViewCache,
    pagination: Pagination,
    tap_unlock: TapUnlock,
    banner: BannerRotator,
    nav: NavVisibility,
    loading: LoadingGate,
    host: H,
    event_receiver: Option<Receiver<StoreEvent>>,
    active: bool,

    // Navigation & overlays
    active_tab: Tab,
    selected: Option<Movie>,
    viewing_story: Option<Movie>,
    pending_details: Option<(Instant, Movie)>,
    sidebar_open: bool,
    admin_open: bool,
}

impl<S: KeyValueStore, H: HostBridge> CineflixApp<S, H> {
    /// `settings` are the compiled-in or configured defaults
    pub fn new(storage: S, host: H, settings: AppSettings) -> Self {
        Self {
            catalog: CatalogSync::new(settings),
            library: UserLibrary::new(storage),
            views: ViewCache::new(),
            pagination: Pagination::new(),
            tap_unlock: TapUnlock::new(),
            banner: BannerRotator::new(),
            nav: NavVisibility::new(),
            loading: LoadingGate::default(),
            host,
            event_receiver: None,
            active: false,
            active_tab: Tab::Home,
            selected: None,
            viewing_story: None,
            pending_details: None,
            sidebar_open: false,
            admin_open: false,
        }
    }

    /// Start the app: local lists, host setup, splash timers and the four
    /// live subscriptions.
    ///
    /// A store that cannot be reached leaves the app running with an empty
    /// catalog; the error is returned for reporting. Calling again while the
    /// app is active retries only the subscriptions.
    pub fn activate<C: CatalogStore + ?Sized>(&mut self, store: &C, now: Instant) -> Result<(), StoreError> {
        if !self.active {
            self.active = true;
            self.nav = NavVisibility::new();
            self.loading = LoadingGate::start(now);
            self.library.load();

            self.host.expand();
            self.host.set_header_color(HOST_THEME_COLOR);
            self.host.set_background_color(HOST_THEME_COLOR);
        }
        if self.catalog.is_active() {
            return Ok(());
        }

        let (sender, receiver) = channel();
        self.event_receiver = Some(receiver);
        self.catalog.activate(store, sender)?;
        self.sync_banner(now);
        Ok(())
    }

    /// Tear everything down. No store event, timer or scroll callback has
    /// any effect afterwards.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.catalog.deactivate();
        self.event_receiver = None;
        self.loading.cancel();
        self.tap_unlock.clear();
        self.banner.stop();
        self.nav.detach();
        self.pending_details = None;
        log::info!("App deactivated");
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Apply queued store events in arrival order. Returns how many changed data.
    pub fn pump(&mut self, now: Instant) -> usize {
        let Some(receiver) = self.event_receiver.as_ref() else {
            return 0;
        };
        let events: Vec<StoreEvent> = receiver.try_iter().collect();

        let mut changed = 0;
        for event in events {
            if self.catalog.apply(event).is_some() {
                changed += 1;
            }
        }
        if changed > 0 {
            self.sync_banner(now);
        }
        changed
    }

    /// Fire every timer that is due
    pub fn tick(&mut self, now: Instant) {
        if !self.active {
            return;
        }
        if self.loading.tick(now) {
            log::info!("Catalog ready ({} movies)", self.catalog.movies().len());
        }
        self.tap_unlock.expire(now);
        self.banner.tick(now);

        if self.pending_details.as_ref().is_some_and(|(due, _)| now >= *due) {
            if let Some((_, movie)) = self.pending_details.take() {
                self.selected = Some(movie);
            }
        }
    }

    fn sync_banner(&mut self, now: Instant) {
        let len = self.views.banners(&self.catalog).len();
        let revision = self.views.banner_revision(&self.catalog);
        self.banner.sync(len, revision, now);
    }

    // --- Interaction handlers ---

    /// Open a movie's details and put it at the front of continue-watching
    pub fn select_movie(&mut self, id: &str, now_ms: i64) -> bool {
        let Some(movie) = self.catalog.find(id).cloned() else {
            log::debug!("Ignoring selection of unknown movie {}", id);
            return false;
        };
        self.library.record_watch(id, now_ms);
        self.selected = Some(movie);
        true
    }

    pub fn close_details(&mut self) {
        self.selected = None;
    }

    /// Returns true when `id` is now a favorite
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let added = self.library.toggle_favorite(id);
        self.host.impact_occurred(ImpactStyle::Light);
        added
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.library.favorites().contains(id)
    }

    /// Open a random movie's details; no-op on an empty catalog
    pub fn surprise_me<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&Movie> {
        let movie = pick_random(self.catalog.movies(), rng)?.clone();
        log::debug!("Surprise pick: {}", movie.title);
        self.selected = Some(movie);
        self.host.notification_occurred(NotificationKind::Success);
        self.selected.as_ref()
    }

    /// Brand logo tap; true when the admin panel opened
    pub fn logo_tap(&mut self, now: Instant) -> bool {
        if self.tap_unlock.tap(now) {
            self.admin_open = true;
            return true;
        }
        false
    }

    pub fn set_category(&mut self, category: Category) {
        self.pagination.set_category(category);
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    /// Window scroll; true when an animation frame should be requested
    pub fn on_scroll(&mut self, y: f32) -> bool {
        self.nav.on_scroll(y)
    }

    /// Animation frame; true when nav visibility changed
    pub fn on_animation_frame(&mut self) -> bool {
        self.nav.on_frame()
    }

    /// Grid layout changed; true when the display limit grew
    pub fn on_grid_layout(&mut self, sentinel_top: f32, viewport_bottom: f32) -> bool {
        let (rendered, total) = self.grid_counts();
        self.pagination.on_layout(sentinel_top, viewport_bottom, rendered, total)
    }

    /// Become-visible event from a platform observer; true when the limit grew
    pub fn on_sentinel_visible(&mut self) -> bool {
        let (rendered, total) = self.grid_counts();
        self.pagination.on_sentinel_visible(rendered, total)
    }

    fn grid_counts(&mut self) -> (usize, usize) {
        let category = self.pagination.category().clone();
        let total = self.views.filtered(&self.catalog, &category).len();
        (total.min(self.pagination.limit()), total)
    }

    /// Banner dot control
    pub fn select_banner(&mut self, index: usize) -> bool {
        self.banner.select(index)
    }

    pub fn open_story(&mut self, id: &str) -> bool {
        match self.catalog.find(id) {
            Some(movie) => {
                self.viewing_story = Some(movie.clone());
                true
            }
            None => false,
        }
    }

    pub fn close_story(&mut self) {
        self.viewing_story = None;
    }

    /// Close the story and open its movie once the story has animated away
    pub fn navigate_from_story(&mut self, now: Instant) {
        if let Some(movie) = self.viewing_story.take() {
            self.pending_details = Some((now + STORY_TO_DETAILS_DELAY, movie));
        }
    }

    pub fn open_sidebar(&mut self) {
        self.sidebar_open = true;
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
    }

    pub fn open_admin_from_sidebar(&mut self) {
        self.admin_open = true;
    }

    pub fn close_admin(&mut self) {
        self.admin_open = false;
    }

    /// Request channel, falling back to the default link
    pub fn open_channel(&mut self) {
        let link = match self.catalog.settings().channel_link.as_str() {
            "" => DEFAULT_CHANNEL_LINK.to_string(),
            link => link.to_string(),
        };
        self.host.open_link(&link);
    }

    // --- Read side ---

    pub fn home(&mut self) -> HomeView {
        let banners = self.views.banners(&self.catalog).to_vec();
        let banner_index = self.banner.index().min(banners.len().saturating_sub(1));
        let trending = self.views.trending(&self.catalog).to_vec();
        let continue_watching = self
            .views
            .continue_watching(
                &self.catalog,
                self.library.continue_watching(),
                self.library.continue_revision(),
            )
            .to_vec();
        let stories: Vec<StoryCard> = self
            .views
            .stories(&self.catalog)
            .iter()
            .take(STORY_RAIL_DISPLAY_CAP)
            .cloned()
            .collect();

        let category = self.pagination.category().clone();
        let grid = self.pagination.page(self.views.filtered(&self.catalog, &category));
        let empty_text = if !grid.items.is_empty() {
            None
        } else if self.catalog.movies().is_empty() {
            Some(LOADING_CONTENT_TEXT)
        } else {
            Some(NO_CONTENT_TEXT)
        };

        let settings = self.catalog.settings();
        HomeView {
            banner_image: banners.get(banner_index).map(|m| m.display_thumbnail().to_string()),
            banner: banners.get(banner_index).cloned(),
            banner_index,
            banner_count: banners.len(),
            trending,
            continue_watching,
            stories,
            channel_link: settings.channel_link.clone(),
            notice_channel_link: settings.notice_channel_link.clone(),
            heading: grid_heading(&category),
            category,
            grid,
            empty_text,
        }
    }

    pub fn favorites(&mut self) -> Vec<Movie> {
        self.views
            .favorites(
                &self.catalog,
                self.library.favorites(),
                self.library.favorites_revision(),
            )
            .to_vec()
    }

    pub fn search(&self, query: &str) -> Vec<Movie> {
        views::search(self.catalog.movies(), query)
    }

    pub fn movies(&self) -> &[Movie] {
        self.catalog.movies()
    }

    pub fn settings(&self) -> &AppSettings {
        self.catalog.settings()
    }

    pub fn revisions(&self) -> Revisions {
        self.catalog.revisions()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn is_nav_visible(&self) -> bool {
        self.nav.is_visible()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn selected(&self) -> Option<&Movie> {
        self.selected.as_ref()
    }

    pub fn viewing_story(&self) -> Option<&Movie> {
        self.viewing_story.as_ref()
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn is_admin_open(&self) -> bool {
        self.admin_open
    }

    pub fn display_limit(&self) -> usize {
        self.pagination.limit()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn library(&self) -> &UserLibrary<S> {
        &self.library
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
