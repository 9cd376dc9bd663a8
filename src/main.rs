//! Cineflix - headless catalog runner
//! Mirrors the live catalog to the log; useful for checking a database
//! before pointing the mini-app at it.

// Use mimalloc for faster memory allocation (Linux, macOS)
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::thread;
use std::time::{Duration, Instant};

use env_logger::{Builder, Target};
use log::LevelFilter;

use cineflix::app::CineflixApp;
use cineflix::config::AppConfig;
use cineflix::host::LogHost;
use cineflix::remote::{HttpStore, HttpStoreConfig};
use cineflix::storage::FileStore;

/// One display frame
const FRAME: Duration = Duration::from_millis(16);

fn init_logger() {
    Builder::new()
        .target(Target::Stdout)
        .filter_level(LevelFilter::Warn)
        .filter_module("cineflix", LevelFilter::Debug)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    // Optional run time in seconds; runs until killed otherwise
    let run_for = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()?
        .map(Duration::from_secs);

    let config = AppConfig::load();
    if config.database_url.is_empty() {
        log::warn!("No database_url configured; set CINEFLIX_DATABASE_URL");
    }

    let store = HttpStore::new(HttpStoreConfig::from_app_config(&config));
    let mut app = CineflixApp::new(FileStore::open_default(), LogHost, config.fallback_settings());

    let started = Instant::now();
    if let Err(e) = app.activate(&store, started) {
        log::error!("Catalog unavailable, running offline: {}", e);
    }

    let mut last_revisions = app.revisions();
    loop {
        let now = Instant::now();
        if run_for.is_some_and(|limit| now.duration_since(started) >= limit) {
            break;
        }

        app.pump(now);
        app.tick(now);
        app.on_animation_frame();

        let revisions = app.revisions();
        if revisions != last_revisions {
            last_revisions = revisions;
            let home = app.home();
            log::info!(
                "Catalog: {} movies, {} banners, {} trending, {} stories, grid \"{}\" {}/{}",
                app.movies().len(),
                home.banner_count,
                home.trending.len(),
                home.stories.len(),
                home.heading,
                home.grid.items.len(),
                home.grid.total,
            );
            if let Some(newest) = app.movies().first() {
                log::info!(
                    "Newest: {} ({})",
                    newest.title,
                    newest.added_on().unwrap_or_else(|| "undated".to_string())
                );
            }
        }

        thread::sleep(FRAME);
    }

    app.deactivate();
    Ok(())
}
