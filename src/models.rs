//! Data models for the Cineflix catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// UI Tab selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Home,
    Search,
    Favorites,
}

/// Catalog category as stored on each movie document.
///
/// Unknown strings are kept verbatim in `Other`, which is also where the
/// legacy `"Korean Drama"` label lands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    All,
    Exclusive,
    Movies,
    WebSeries,
    KDrama,
    Anime,
    Other(String),
}

impl Category {
    /// Selectable categories in display order
    pub const ALL_TABS: [Category; 6] = [
        Category::All,
        Category::Exclusive,
        Category::Movies,
        Category::WebSeries,
        Category::KDrama,
        Category::Anime,
    ];

    /// Legacy label still present on older documents
    pub const LEGACY_KOREAN_DRAMA: &'static str = "Korean Drama";

    pub fn label(&self) -> &str {
        match self {
            Category::All => "All",
            Category::Exclusive => "Exclusive",
            Category::Movies => "Movies",
            Category::WebSeries => "Web Series",
            Category::KDrama => "K-Drama",
            Category::Anime => "Anime",
            Category::Other(s) => s,
        }
    }

    pub fn is_legacy_korean_drama(&self) -> bool {
        matches!(self, Category::Other(s) if s == Self::LEGACY_KOREAN_DRAMA)
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "All" => Category::All,
            "Exclusive" => Category::Exclusive,
            "Movies" => Category::Movies,
            "Web Series" => Category::WebSeries,
            "K-Drama" => Category::KDrama,
            "Anime" => Category::Anime,
            _ => Category::Other(s),
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::from(s.to_string())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Other(s) => s,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Document creation time (seconds since epoch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(default)]
    pub seconds: i64,
    #[serde(default)]
    pub nanoseconds: i64,
}

impl Timestamp {
    pub fn from_seconds(seconds: i64) -> Self {
        Self { seconds, nanoseconds: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_position")]
    pub season: Option<u32>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub episode: Option<u32>,
}

/// A catalog entry (movie or series)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: String,
    /// Display override filled in by the banner derivation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_thumbnail: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: Category,
    /// Stored as a number or numeric text; anything else reads as 0
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: f64,
    #[serde(default)]
    pub episodes: Option<Vec<Episode>>,
    #[serde(default, rename = "isTop10", deserialize_with = "null_as_default")]
    pub is_top10: bool,
    #[serde(default, rename = "top10Position", deserialize_with = "lenient_position")]
    pub top10_position: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_exclusive: bool,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub description: Option<String>,
    /// Stored as either text or a number
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub quality: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl Movie {
    pub fn new(id: &str, title: &str, category: impl Into<Category>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// True for series-like content (at least one episode)
    pub fn has_episodes(&self) -> bool {
        self.episodes.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Creation time in seconds; missing timestamps count as 0
    pub fn created_seconds(&self) -> i64 {
        self.created_at.map(|t| t.seconds).unwrap_or(0)
    }

    /// Top-10 ordinal; unset (or 0) positions sort as 10
    pub fn effective_top10_position(&self) -> u32 {
        match self.top10_position {
            Some(p) if p > 0 => p,
            _ => 10,
        }
    }

    /// Image to show in the banner slot
    pub fn display_thumbnail(&self) -> &str {
        self.banner_thumbnail.as_deref().unwrap_or(&self.thumbnail)
    }

    /// Upload date as YYYY-MM-DD (UTC), if known
    pub fn added_on(&self) -> Option<String> {
        use chrono::{TimeZone, Utc};

        let created = self.created_at?;
        Utc.timestamp_opt(created.seconds, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
    }
}

// Catalog documents are edited by hand and never validated server side, so
// scalar fields accept null and the obvious alternate encodings.

/// `null` reads as the type's default
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

fn string_or_number<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match serde_json::Value::deserialize(de)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

fn lenient_f64<'de, D: serde::Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    Ok(number_value(&serde_json::Value::deserialize(de)?).unwrap_or(0.0))
}

fn lenient_number<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(number_value(&serde_json::Value::deserialize(de)?))
}

fn lenient_position<'de, D: serde::Deserializer<'de>>(de: D) -> Result<Option<u32>, D::Error> {
    Ok(number_value(&serde_json::Value::deserialize(de)?)
        .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}

/// Promotional banner entry managed from the admin panel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub movie_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub order: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
}

/// Story rail entry managed from the admin panel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub movie_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub story_badge: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub order: Option<f64>,
}

pub const DEFAULT_BOT_USERNAME: &str = "Cinaflix_Streembot";
pub const DEFAULT_CHANNEL_LINK: &str = "https://t.me/cineflixrequestcontent";

/// Singleton `settings/config` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
    #[serde(default = "default_channel_link")]
    pub channel_link: String,
    #[serde(default)]
    pub notice_channel_link: Option<String>,
}

fn default_bot_username() -> String { DEFAULT_BOT_USERNAME.to_string() }
fn default_channel_link() -> String { DEFAULT_CHANNEL_LINK.to_string() }

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bot_username: default_bot_username(),
            channel_link: default_channel_link(),
            notice_channel_link: None,
        }
    }
}

/// Continue-watching item (persisted to JSON)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWatchingEntry {
    pub movie_id: String,
    /// Last access, milliseconds since epoch
    pub timestamp: i64,
}

/// One story rail card
#[derive(Debug, Clone, PartialEq)]
pub struct StoryCard {
    pub movie: Movie,
    pub badge: String,
}
