//! TTL-bounded store of raw feed payloads.
//!
//! Payloads are kept unparsed so a hit goes through the same normalizer as a
//! live fetch. Every `put` schedules its own [`ExpiryTimer`]; there is no
//! size-based eviction.

pub mod expiry;
pub mod sqlite;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::app::{FeedfsError, Result};

pub use expiry::ExpiryTimer;
pub use sqlite::SqliteCacheStore;

const KEY_PREFIX: &str = "feed-";

/// Storage backend for cache rows.
pub trait CacheStore: Send + Sync {
    /// Returns the payload unless missing or expired at `now`.
    fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, payload: &[u8], expires_at: DateTime<Utc>) -> Result<()>;
    fn remove(&self, key: &str) -> Result<bool>;
    fn clear(&self) -> Result<usize>;
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Cache key for a feed URL: every non-alphanumeric character removed.
pub fn cache_key(url: &str) -> String {
    let stripped: String = url.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("{}{}", KEY_PREFIX, stripped)
}

/// A fetched, unparsed feed body as it is serialized into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPayload {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    /// Hex SHA-256 of `body`.
    pub sha256: String,
    pub body: Vec<u8>,
}

impl CachedPayload {
    pub fn new(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            fetched_at: Utc::now(),
            sha256: Self::digest(&body),
            body,
        }
    }

    fn digest(body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body);
        let digest = hasher.finalize();
        hex::encode(&digest[..])
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| FeedfsError::CacheCodec(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let payload: Self =
            serde_json::from_slice(bytes).map_err(|e| FeedfsError::CacheCodec(e.to_string()))?;

        if Self::digest(&payload.body) != payload.sha256 {
            return Err(FeedfsError::CacheCodec(format!(
                "digest mismatch for {}",
                payload.url
            )));
        }

        Ok(payload)
    }
}

/// The cache as the fetch path sees it: a store plus its expiry timers.
pub struct FeedCache {
    store: Arc<dyn CacheStore>,
    timers: Mutex<HashMap<String, ExpiryTimer>>,
}

impl FeedCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Drops rows whose expiry passed while no timer was watching them.
    pub fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired(Utc::now())
    }

    /// Store errors are reported and read as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key, Utc::now()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Reading cache entry {} failed: {}", key, e);
                None
            }
        }
    }

    /// Stores `payload` and schedules its removal after `ttl_minutes`.
    ///
    /// A pending timer for the same key is cancelled first.
    pub fn put(&self, key: &str, payload: &[u8], ttl_minutes: u32) -> Result<()> {
        let ttl = Duration::from_secs(u64::from(ttl_minutes) * 60);
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).map_err(|e| FeedfsError::Other(e.to_string()))?;

        let mut timers = self
            .timers
            .lock()
            .map_err(|e| FeedfsError::Other(format!("Cache timer registry poisoned: {}", e)))?;

        if let Some(previous) = timers.remove(key) {
            previous.cancel();
        }
        timers.retain(|_, timer| !timer.is_finished());

        self.store.put(key, payload, expires_at)?;

        if let Some(timer) = ExpiryTimer::schedule(self.store.clone(), key.to_string(), ttl) {
            timers.insert(key.to_string(), timer);
        }

        Ok(())
    }

    /// Looks up and decodes the payload cached for `url`.
    ///
    /// A payload that fails to decode, or that was stored for another URL
    /// sharing the same key, counts as a miss.
    pub fn load(&self, url: &str) -> Option<CachedPayload> {
        let bytes = self.get(&cache_key(url))?;
        match CachedPayload::decode(&bytes) {
            Ok(payload) if payload.url == url => Some(payload),
            Ok(payload) => {
                debug!("Cache key for '{}' holds '{}'", url, payload.url);
                None
            }
            Err(e) => {
                warn!("Decoding the cache entry for '{}' failed: {}", url, e);
                None
            }
        }
    }

    pub fn store(&self, url: &str, body: Vec<u8>, ttl_minutes: u32) -> Result<()> {
        let encoded = CachedPayload::new(url, body).encode()?;
        self.put(&cache_key(url), &encoded, ttl_minutes)
    }

    pub fn clear(&self) -> Result<usize> {
        self.cancel_timers();
        self.store.clear()
    }

    /// Cancels every outstanding expiry timer.
    pub fn shutdown(&self) {
        self.cancel_timers();
    }

    pub fn pending_timers(&self) -> usize {
        self.timers
            .lock()
            .map(|timers| timers.values().filter(|t| !t.is_finished()).count())
            .unwrap_or(0)
    }

    fn cancel_timers(&self) {
        if let Ok(mut timers) = self.timers.lock() {
            for (_, timer) in timers.drain() {
                timer.cancel();
            }
        }
    }
}
