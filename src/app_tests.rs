//! Tests for the application controller

use std::cell::Cell;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::app::*;
use crate::host::{HostBridge, ImpactStyle, NotificationKind};
use crate::models::*;
use crate::error::StoreError;
use crate::remote::{CatalogStore, MemoryStore as RemoteStore, Snapshot, Source, StoreEvent, Subscription};
use crate::storage::{MemoryStore as LocalStore, FAVORITES_KEY};

#[derive(Debug, Default)]
struct RecordingHost {
    calls: Vec<String>,
}

impl HostBridge for RecordingHost {
    fn expand(&mut self) {
        self.calls.push("expand".to_string());
    }

    fn set_header_color(&mut self, color: &str) {
        self.calls.push(format!("header {}", color));
    }

    fn set_background_color(&mut self, color: &str) {
        self.calls.push(format!("background {}", color));
    }

    fn notification_occurred(&mut self, kind: NotificationKind) {
        self.calls.push(format!("notify {:?}", kind));
    }

    fn impact_occurred(&mut self, style: ImpactStyle) {
        self.calls.push(format!("impact {:?}", style));
    }

    fn open_link(&mut self, url: &str) {
        self.calls.push(format!("open {}", url));
    }
}

type TestApp = CineflixApp<LocalStore, RecordingHost>;

fn movie(id: &str, category: &str, created: i64) -> Movie {
    Movie {
        created_at: Some(Timestamp::from_seconds(created)),
        ..Movie::new(id, &format!("Title {}", id), category)
    }
}

fn started(local: LocalStore) -> (TestApp, RemoteStore, Instant) {
    let remote = RemoteStore::new();
    let now = Instant::now();
    let mut app = CineflixApp::new(local, RecordingHost::default(), AppSettings::default());
    app.activate(&remote, now).unwrap();
    (app, remote, now)
}

#[test]
fn test_activate_prepares_host_and_splash() {
    let (mut app, _remote, now) = started(LocalStore::new());

    assert_eq!(
        app.host().calls,
        vec!["expand", "header #000000", "background #000000"]
    );
    assert!(app.is_active());
    assert!(app.is_loading());

    app.tick(now + Duration::from_millis(1499));
    assert!(app.is_loading());
    app.tick(now + Duration::from_millis(1500));
    assert!(!app.is_loading());
}

#[test]
fn test_home_before_and_after_movies_arrive() {
    let (mut app, remote, now) = started(LocalStore::new());

    let home = app.home();
    assert_eq!(home.heading, "Just Added");
    assert_eq!(home.empty_text, Some(LOADING_CONTENT_TEXT));
    assert!(home.banner.is_none());

    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1), movie("b", "Exclusive", 2)]));
    assert_eq!(app.pump(now), 1);

    let home = app.home();
    assert_eq!(home.empty_text, None);
    let ids: Vec<_> = home.grid.items.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(home.banner.as_ref().map(|m| m.id.as_str()), Some("b"));
    assert_eq!(home.banner_count, 1);
    assert_eq!(home.stories.len(), 2);
    assert_eq!(home.channel_link, DEFAULT_CHANNEL_LINK);
}

#[test]
fn test_empty_category_shows_no_content() {
    let (mut app, remote, now) = started(LocalStore::new());
    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1)]));
    app.pump(now);

    app.set_category(Category::Anime);
    let home = app.home();
    assert_eq!(home.heading, "Anime Collection");
    assert!(home.grid.items.is_empty());
    assert_eq!(home.empty_text, Some(NO_CONTENT_TEXT));
}

#[test]
fn test_select_movie_records_continue_watching() {
    let (mut app, remote, now) = started(LocalStore::new());
    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1), movie("b", "Movies", 2)]));
    app.pump(now);

    assert!(app.select_movie("a", 1_000));
    assert!(app.select_movie("b", 2_000));
    assert!(app.select_movie("a", 3_000));
    assert!(!app.select_movie("ghost", 4_000));

    assert_eq!(app.selected().map(|m| m.id.as_str()), Some("a"));
    let entries: Vec<_> = app
        .library()
        .continue_watching()
        .iter()
        .map(|e| (e.movie_id.as_str(), e.timestamp))
        .collect();
    assert_eq!(entries, vec![("a", 3_000), ("b", 2_000)]);

    let cw: Vec<_> = app.home().continue_watching.into_iter().map(|m| m.id).collect();
    assert_eq!(cw, vec!["a", "b"]);

    app.close_details();
    assert!(app.selected().is_none());
}

#[test]
fn test_toggle_favorite_fires_light_impact() {
    let local = LocalStore::new().with(FAVORITES_KEY, r#"["b"]"#);
    let (mut app, remote, now) = started(local);
    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1), movie("b", "Movies", 2)]));
    app.pump(now);

    assert!(app.is_favorite("b"));
    assert!(app.toggle_favorite("a"));
    assert!(app.host().calls.contains(&"impact Light".to_string()));

    let favs: Vec<_> = app.favorites().into_iter().map(|m| m.id).collect();
    assert_eq!(favs, vec!["b", "a"]);

    assert!(!app.toggle_favorite("b"));
    let favs: Vec<_> = app.favorites().into_iter().map(|m| m.id).collect();
    assert_eq!(favs, vec!["a"]);
}

#[test]
fn test_surprise_me_needs_movies() {
    let (mut app, remote, now) = started(LocalStore::new());
    let mut rng = StdRng::seed_from_u64(7);

    assert!(app.surprise_me(&mut rng).is_none());
    assert!(!app.host().calls.iter().any(|c| c.starts_with("notify")));

    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1), movie("b", "Movies", 2)]));
    app.pump(now);
    let picked = app.surprise_me(&mut rng).map(|m| m.id.clone());
    assert!(matches!(picked.as_deref(), Some("a") | Some("b")));
    assert_eq!(app.selected().map(|m| m.id.clone()), picked);
    assert!(app.host().calls.contains(&"notify Success".to_string()));
}

#[test]
fn test_logo_taps_open_admin() {
    let (mut app, _remote, now) = started(LocalStore::new());

    for i in 0..4 {
        assert!(!app.logo_tap(now + Duration::from_millis(100 * i)));
    }
    assert!(app.logo_tap(now + Duration::from_millis(500)));
    assert!(app.is_admin_open());

    app.close_admin();
    assert!(!app.is_admin_open());
}

#[test]
fn test_slow_logo_taps_never_unlock() {
    let (mut app, _remote, now) = started(LocalStore::new());

    for i in 0..10u64 {
        let t = now + Duration::from_millis(2100 * i);
        app.tick(t);
        assert!(!app.logo_tap(t));
    }
    assert!(!app.is_admin_open());
}

#[test]
fn test_sidebar_admin_entry() {
    let (mut app, _remote, _now) = started(LocalStore::new());
    app.open_sidebar();
    assert!(app.is_sidebar_open());
    app.open_admin_from_sidebar();
    app.close_sidebar();
    assert!(app.is_admin_open());
    assert!(!app.is_sidebar_open());
}

#[test]
fn test_story_navigation_opens_details_after_delay() {
    let (mut app, remote, now) = started(LocalStore::new());
    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1)]));
    app.pump(now);

    assert!(app.open_story("a"));
    assert_eq!(app.viewing_story().map(|m| m.id.as_str()), Some("a"));

    app.navigate_from_story(now);
    assert!(app.viewing_story().is_none());
    app.tick(now + Duration::from_millis(299));
    assert!(app.selected().is_none());
    app.tick(now + STORY_TO_DETAILS_DELAY);
    assert_eq!(app.selected().map(|m| m.id.as_str()), Some("a"));

    // Opening from a story does not touch continue-watching
    assert!(app.library().continue_watching().is_empty());
}

#[test]
fn test_banner_rotates_and_dots_select() {
    let (mut app, remote, now) = started(LocalStore::new());
    remote.publish(Snapshot::Movies(vec![
        movie("a", "Exclusive", 3),
        movie("b", "Exclusive", 2),
        movie("c", "Exclusive", 1),
    ]));
    app.pump(now);
    assert_eq!(app.home().banner_index, 0);

    app.tick(now + Duration::from_secs(6));
    assert_eq!(app.home().banner_index, 1);

    assert!(app.select_banner(0));
    assert_eq!(app.home().banner.map(|m| m.id), Some("a".to_string()));
    assert!(!app.select_banner(3));
}

#[test]
fn test_grid_grows_on_sentinel() {
    let (mut app, remote, now) = started(LocalStore::new());
    let movies: Vec<_> = (0..25).map(|i| movie(&format!("m{}", i), "Movies", i)).collect();
    remote.publish(Snapshot::Movies(movies));
    app.pump(now);

    assert_eq!(app.home().grid.items.len(), 18);
    assert!(app.home().grid.show_loading_more);
    assert!(app.on_sentinel_visible());
    let grid = app.home().grid;
    assert_eq!(grid.items.len(), 25);
    assert!(!grid.show_loading_more);
    assert!(!app.on_sentinel_visible());

    app.set_category(Category::Exclusive);
    assert_eq!(app.display_limit(), 18);
}

#[test]
fn test_grid_layout_drives_sentinel() {
    let (mut app, remote, now) = started(LocalStore::new());
    let movies: Vec<_> = (0..40).map(|i| movie(&format!("m{}", i), "Movies", i)).collect();
    remote.publish(Snapshot::Movies(movies));
    app.pump(now);

    assert!(!app.on_grid_layout(2000.0, 1000.0));
    assert!(app.on_grid_layout(1300.0, 1000.0));
    assert_eq!(app.display_limit(), 30);
}

#[test]
fn test_nav_hides_on_scroll_down() {
    let (mut app, _remote, _now) = started(LocalStore::new());
    assert!(app.is_nav_visible());

    assert!(app.on_scroll(300.0));
    assert!(app.on_animation_frame());
    assert!(!app.is_nav_visible());

    assert!(app.on_scroll(250.0));
    assert!(app.on_animation_frame());
    assert!(app.is_nav_visible());
}

#[test]
fn test_settings_drive_channel_link() {
    let (mut app, remote, now) = started(LocalStore::new());
    app.open_channel();

    remote.publish(Snapshot::Settings(Some(AppSettings {
        channel_link: "https://t.me/other".to_string(),
        notice_channel_link: Some("https://t.me/notice".to_string()),
        ..AppSettings::default()
    })));
    app.pump(now);
    app.open_channel();

    let opened: Vec<_> = app
        .host()
        .calls
        .iter()
        .filter(|c| c.starts_with("open"))
        .cloned()
        .collect();
    assert_eq!(
        opened,
        vec![format!("open {}", DEFAULT_CHANNEL_LINK), "open https://t.me/other".to_string()]
    );
    assert_eq!(app.home().notice_channel_link.as_deref(), Some("https://t.me/notice"));
}

#[test]
fn test_search_tab() {
    let (mut app, remote, now) = started(LocalStore::new());
    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1), movie("b", "Movies", 2)]));
    app.pump(now);

    app.set_tab(Tab::Search);
    assert_eq!(app.active_tab(), Tab::Search);
    let hits: Vec<_> = app.search("title A").into_iter().map(|m| m.id).collect();
    assert_eq!(hits, vec!["a"]);
}

#[test]
fn test_deactivate_stops_everything() {
    let (mut app, remote, now) = started(LocalStore::new());
    remote.publish(Snapshot::Movies(vec![movie("a", "Exclusive", 1), movie("b", "Exclusive", 2)]));
    app.pump(now);
    app.logo_tap(now);
    app.on_scroll(300.0);

    app.deactivate();
    assert!(!app.is_active());
    assert_eq!(remote.subscriber_count(), 0);

    remote.publish(Snapshot::Movies(Vec::new()));
    assert_eq!(app.pump(now), 0);
    assert_eq!(app.movies().len(), 2);

    app.tick(now + Duration::from_secs(10));
    assert!(app.is_loading());
    assert_eq!(app.home().banner_index, 0);
    assert!(!app.on_animation_frame());

    // Idempotent
    app.deactivate();
}

#[test]
fn test_wall_clock_selection() {
    let (mut app, remote, now) = started(LocalStore::new());
    remote.publish(Snapshot::Movies(vec![movie("a", "Movies", 1)]));
    app.pump(now);

    let before = now_millis();
    assert!(app.select_movie("a", now_millis()));
    assert!(app.library().continue_watching()[0].timestamp >= before);
}

/// Remote store that refuses subscriptions until it is brought up
struct OutageStore {
    inner: RemoteStore,
    up: Cell<bool>,
}

impl CatalogStore for OutageStore {
    fn subscribe(&self, source: Source, sink: Sender<StoreEvent>) -> Result<Subscription, StoreError> {
        if !self.up.get() {
            return Err(StoreError::Transport("offline".to_string()));
        }
        self.inner.subscribe(source, sink)
    }
}

#[test]
fn test_activate_retries_subscriptions_after_failure() {
    let store = OutageStore { inner: RemoteStore::new(), up: Cell::new(false) };
    let now = Instant::now();
    let mut app = CineflixApp::new(LocalStore::new(), RecordingHost::default(), AppSettings::default());

    assert!(app.activate(&store, now).is_err());
    assert!(app.is_active());
    assert_eq!(store.inner.subscriber_count(), 0);

    store.up.set(true);
    app.activate(&store, now).unwrap();
    assert_eq!(store.inner.subscriber_count(), 4);
    // Host setup and splash happen once
    assert_eq!(app.host().calls.len(), 3);

    store.inner.publish(Snapshot::Movies(vec![movie("a", "Movies", 1)]));
    assert_eq!(app.pump(now), 1);

    // Already subscribed: nothing new is opened
    app.activate(&store, now).unwrap();
    assert_eq!(store.inner.subscriber_count(), 4);
}

#[test]
fn test_banner_image_prefers_override() {
    let (mut app, remote, now) = started(LocalStore::new());
    let mut featured = movie("a", "Movies", 1);
    featured.thumbnail = "poster.jpg".to_string();
    remote.publish(Snapshot::Movies(vec![featured]));
    remote.publish(Snapshot::Banners(vec![BannerItem {
        id: "b1".to_string(),
        movie_id: "a".to_string(),
        image: Some("wide.jpg".to_string()),
        order: Some(1.0),
        is_active: true,
    }]));
    app.pump(now);

    let home = app.home();
    assert_eq!(home.banner_image.as_deref(), Some("wide.jpg"));
    assert_eq!(home.banner.map(|m| m.thumbnail), Some("poster.jpg".to_string()));

    remote.publish(Snapshot::Banners(Vec::new()));
    remote.publish(Snapshot::Movies(vec![Movie {
        thumbnail: "ex.jpg".to_string(),
        ..movie("ex", "Exclusive", 2)
    }]));
    app.pump(now);
    assert_eq!(app.home().banner_image.as_deref(), Some("ex.jpg"));
}
