//! In-process store, used by tests and offline runs

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use super::{subscription_pair, CatalogStore, Publisher, Snapshot, Source, StoreEvent, Subscription};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    publishers: Vec<Publisher>,
    latest: HashMap<Source, Snapshot>,
}

/// Cloneable handle; all clones share subscribers and data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a source's data and notify its live subscribers
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = snapshot.ordered();
        let source = snapshot.source();
        let mut inner = self.lock();
        inner.publishers.retain(|p| p.is_active());
        for publisher in inner.publishers.iter().filter(|p| p.source() == source) {
            publisher.emit(Ok(snapshot.clone()));
        }
        inner.latest.insert(source, snapshot);
    }

    /// Deliver an error on a source's live subscriptions
    pub fn fail(&self, source: Source, error: StoreError) {
        let mut inner = self.lock();
        inner.publishers.retain(|p| p.is_active());
        for publisher in inner.publishers.iter().filter(|p| p.source() == source) {
            publisher.emit(Err(error.clone()));
        }
    }

    /// Live subscriptions currently registered
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.publishers.retain(|p| p.is_active());
        inner.publishers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep going
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CatalogStore for MemoryStore {
    fn subscribe(&self, source: Source, sink: Sender<StoreEvent>) -> Result<Subscription, StoreError> {
        let (subscription, publisher) = subscription_pair(source, sink);
        let mut inner = self.lock();
        // Initial snapshot, as a live listener would receive on attach
        if let Some(current) = inner.latest.get(&source) {
            publisher.emit(Ok(current.clone()));
        }
        inner.publishers.push(publisher);
        Ok(subscription)
    }
}
