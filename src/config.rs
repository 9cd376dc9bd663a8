//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::models::{AppSettings, DEFAULT_BOT_USERNAME, DEFAULT_CHANNEL_LINK};

pub const APP_DIR: &str = "cineflix";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the realtime database (e.g. https://<project>.firebaseio.com)
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    // Fallbacks used until the settings document arrives
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
    #[serde(default = "default_channel_link")]
    pub channel_link: String,
}

fn default_poll_interval() -> u64 { 5000 }
fn default_request_timeout() -> u64 { 30 }
fn default_user_agent() -> String { "Cineflix/0.2".to_string() }
fn default_bot_username() -> String { DEFAULT_BOT_USERNAME.to_string() }
fn default_channel_link() -> String { DEFAULT_CHANNEL_LINK.to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            auth_token: String::new(),
            poll_interval_ms: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            bot_username: default_bot_username(),
            channel_link: default_channel_link(),
        }
    }
}

/// `<config_dir>/cineflix/<file>`, creating the directory if needed
pub fn app_file(file: &str) -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    fs::create_dir_all(&path).ok();
    path.push(file);
    path
}

impl AppConfig {
    fn config_path() -> PathBuf {
        app_file("config.json")
    }

    /// Load from disk, then apply `CINEFLIX_*` environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::config_path());
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring malformed config {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Cannot read config {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("CINEFLIX_DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database_url = url;
        }
        if let Some(token) = var("CINEFLIX_AUTH_TOKEN").filter(|v| !v.is_empty()) {
            self.auth_token = token;
        }
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Ok(content) = serde_json::to_string_pretty(self) {
            if let Err(e) = fs::write(&path, content) {
                log::warn!("Failed to save config {}: {}", path.display(), e);
            }
        }
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms.max(250))
    }

    /// Settings shown until the remote settings document arrives
    pub fn fallback_settings(&self) -> AppSettings {
        AppSettings {
            bot_username: self.bot_username.clone(),
            channel_link: self.channel_link.clone(),
            notice_channel_link: None,
        }
    }
}
