//! Realtime-database REST backend
//! Polls `GET {base}/{path}.json` per subscription and republishes the body
//! as a full snapshot whenever it changes.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use super::{decode_snapshot, subscription_pair, CatalogStore, Publisher, Source, StoreEvent, Subscription};
use crate::config::AppConfig;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl HttpStoreConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.database_url.trim_end_matches('/').to_string(),
            auth_token: Some(config.auth_token.clone()).filter(|t| !t.is_empty()),
            poll_interval: config.poll_interval(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Store backed by periodic REST reads
#[derive(Debug, Clone)]
pub struct HttpStore {
    config: HttpStoreConfig,
    agent: ureq::Agent,
}

impl HttpStore {
    pub fn new(config: HttpStoreConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.request_timeout))
            .timeout_connect(Some(Duration::from_secs(10)))
            .max_idle_connections(4)
            .max_idle_connections_per_host(4)
            .build()
            .new_agent();
        Self { config, agent }
    }

    pub fn url_for(&self, source: Source) -> String {
        let mut url = format!("{}/{}.json", self.config.base_url, source.path());
        if let Some(token) = &self.config.auth_token {
            url.push_str("?auth=");
            url.push_str(token);
        }
        url
    }

    fn fetch(&self, url: &str) -> Result<String, StoreError> {
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", &self.config.user_agent)
            .header("Accept", "application/json")
            .call()?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(StoreError::Status(status));
        }

        Ok(response.body_mut().read_to_string()?)
    }

    fn poll_loop(self, publisher: Publisher) {
        let source = publisher.source();
        let url = self.url_for(source);
        let mut last_body: Option<String> = None;
        let mut failing = false;

        while publisher.is_active() {
            match self.fetch(&url) {
                Ok(body) => {
                    failing = false;
                    if last_body.as_deref() != Some(body.as_str()) {
                        let result = decode_snapshot(source, &body);
                        if let Err(e) = &result {
                            log::warn!("{:?} snapshot could not be decoded: {}", source, e);
                        }
                        last_body = Some(body);
                        if !publisher.emit(result) {
                            break;
                        }
                    }
                }
                Err(e) => {
                    // Report once per failure streak
                    if !failing {
                        failing = true;
                        last_body = None;
                        if !publisher.emit(Err(e)) {
                            break;
                        }
                    }
                }
            }

            self.sleep_while_active(&publisher);
        }

        log::debug!("{:?} poller stopped", source);
    }

    // Sleep in short steps so a release is noticed promptly
    fn sleep_while_active(&self, publisher: &Publisher) {
        const STEP: Duration = Duration::from_millis(100);
        let mut remaining = self.config.poll_interval;
        while publisher.is_active() && !remaining.is_zero() {
            let step = remaining.min(STEP);
            thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
    }
}

impl CatalogStore for HttpStore {
    fn subscribe(&self, source: Source, sink: Sender<StoreEvent>) -> Result<Subscription, StoreError> {
        if self.config.base_url.is_empty() {
            return Err(StoreError::Transport("database URL is not configured".to_string()));
        }

        let (subscription, publisher) = subscription_pair(source, sink);
        let store = self.clone();
        thread::Builder::new()
            .name(format!("cineflix-{}", source.path().replace('/', "-")))
            .spawn(move || store.poll_loop(publisher))
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        log::info!("Subscribed to {} (#{})", source.path(), subscription.id());
        Ok(subscription)
    }
}
