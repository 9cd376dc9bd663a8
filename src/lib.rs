//! Cineflix catalog core
//!
//! Live catalog synchronization against a realtime document store, the
//! derived home-screen views and the timers and gestures that drive them.

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod interaction;
pub mod library;
pub mod models;
pub mod paging;
pub mod remote;
pub mod storage;
pub mod views;

pub use app::{CineflixApp, HomeView};
pub use config::AppConfig;
pub use error::{StorageError, StoreError};
