//! Remote catalog store contract
//!
//! A store delivers full snapshots of four sources (movies, settings, banners,
//! stories) through an mpsc channel. Each subscription hands back a
//! [`Subscription`] disposer.

mod http;
mod memory;

pub use http::{HttpStore, HttpStoreConfig};
pub use memory::MemoryStore;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{AppSettings, BannerItem, Movie, StoryItem};

/// Remote sources the catalog listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Movies,
    Settings,
    Banners,
    Stories,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Movies, Source::Settings, Source::Banners, Source::Stories];

    /// Collection or document path in the store
    pub fn path(&self) -> &'static str {
        match self {
            Source::Movies => "movies",
            Source::Settings => "settings/config",
            Source::Banners => "banners",
            Source::Stories => "stories",
        }
    }

    /// Whether the query is ordered by the `order` field ascending
    pub fn is_ordered(&self) -> bool {
        matches!(self, Source::Banners | Source::Stories)
    }
}

/// A complete replacement view of one source
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Movies(Vec<Movie>),
    /// `None` when the document does not exist
    Settings(Option<AppSettings>),
    Banners(Vec<BannerItem>),
    Stories(Vec<StoryItem>),
}

impl Snapshot {
    pub fn source(&self) -> Source {
        match self {
            Snapshot::Movies(_) => Source::Movies,
            Snapshot::Settings(_) => Source::Settings,
            Snapshot::Banners(_) => Source::Banners,
            Snapshot::Stories(_) => Source::Stories,
        }
    }

    /// Apply the query ordering of the source
    pub fn ordered(self) -> Self {
        match self {
            Snapshot::Banners(items) => Snapshot::Banners(order_by_key(items)),
            Snapshot::Stories(items) => Snapshot::Stories(order_by_key(items)),
            other => other,
        }
    }
}

pub type SubscriptionId = u64;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// One delivery from a subscription
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub subscription: SubscriptionId,
    pub source: Source,
    pub result: Result<Snapshot, StoreError>,
}

/// Consumer-side disposer for a live subscription.
///
/// Releasing is idempotent and also happens on drop.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    source: Source,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Returns true only for the call that actually released it
    pub fn unsubscribe(&self) -> bool {
        let released = self.active.swap(false, Ordering::SeqCst);
        if released {
            log::debug!("Released {:?} subscription #{}", self.source, self.id);
        }
        released
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Producer-side end of a subscription
#[derive(Debug, Clone)]
pub struct Publisher {
    id: SubscriptionId,
    source: Source,
    active: Arc<AtomicBool>,
    sink: Sender<StoreEvent>,
}

impl Publisher {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Deliver a result; false once released or when the consumer is gone
    pub fn emit(&self, result: Result<Snapshot, StoreError>) -> bool {
        if !self.is_active() {
            return false;
        }
        let event = StoreEvent {
            subscription: self.id,
            source: self.source,
            result,
        };
        if self.sink.send(event).is_err() {
            self.active.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }
}

/// Create the two ends of a new subscription
pub fn subscription_pair(source: Source, sink: Sender<StoreEvent>) -> (Subscription, Publisher) {
    let id = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
    let active = Arc::new(AtomicBool::new(true));
    (
        Subscription {
            id,
            source,
            active: Arc::clone(&active),
        },
        Publisher {
            id,
            source,
            active,
            sink,
        },
    )
}

/// A document store with live change notifications
pub trait CatalogStore {
    fn subscribe(&self, source: Source, sink: Sender<StoreEvent>) -> Result<Subscription, StoreError>;
}

/// Items carrying an explicit ordering key
pub trait OrderKey {
    fn order_key(&self) -> Option<f64>;
}

impl OrderKey for BannerItem {
    fn order_key(&self) -> Option<f64> {
        self.order
    }
}

impl OrderKey for StoryItem {
    fn order_key(&self) -> Option<f64> {
        self.order
    }
}

/// Ascending by `order`; items without the field are not part of the query
pub fn order_by_key<T: OrderKey>(items: Vec<T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().filter(|i| i.order_key().is_some()).collect();
    items.sort_by(|a, b| {
        let (a, b) = (a.order_key().unwrap_or_default(), b.order_key().unwrap_or_default());
        a.total_cmp(&b)
    });
    items
}

/// Decode a collection body: an object keyed by document id, an array, or null.
///
/// Documents are decoded one by one; a document that does not fit the shape
/// is logged and skipped so the rest of the collection still arrives.
pub fn decode_collection<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, StoreError> {
    let docs: Vec<(String, Value)> = match body {
        Value::Null => Vec::new(),
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => {
            return Err(StoreError::Decode(format!(
                "expected collection, got {}",
                json_kind(&other)
            )))
        }
    };

    let total = docs.len();
    let decoded: Vec<T> = docs
        .into_iter()
        .filter_map(|(key, mut doc)| {
            if let Value::Object(fields) = &mut doc {
                let has_id = fields.get("id").is_some_and(|id| id.as_str().is_some_and(|s| !s.is_empty()));
                if !has_id {
                    fields.insert("id".to_string(), Value::String(key.clone()));
                }
            }
            match serde_json::from_value(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("Skipping document '{}': {}", key, e);
                    None
                }
            }
        })
        .collect();

    if decoded.len() < total {
        log::warn!("Decoded {} of {} documents", decoded.len(), total);
    }
    Ok(decoded)
}

/// Decode a single document body; null means it does not exist
pub fn decode_document<T: DeserializeOwned>(body: Value) -> Result<Option<T>, StoreError> {
    match body {
        Value::Null => Ok(None),
        doc => Ok(Some(serde_json::from_value(doc)?)),
    }
}

/// Decode a response body for `source` into an ordered snapshot
pub fn decode_snapshot(source: Source, body: &str) -> Result<Snapshot, StoreError> {
    let value: Value = serde_json::from_str(body)?;
    let snapshot = match source {
        Source::Movies => Snapshot::Movies(decode_collection(value)?),
        Source::Settings => Snapshot::Settings(decode_document(value)?),
        Source::Banners => Snapshot::Banners(decode_collection(value)?),
        Source::Stories => Snapshot::Stories(decode_collection(value)?),
    };
    Ok(snapshot.ordered())
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
