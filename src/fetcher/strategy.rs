use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::app::Result;
use crate::cache::FeedCache;
use crate::domain::{FeedSource, ParsedFeed};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;

/// Turns a configured source into a parsed feed.
#[async_trait]
pub trait FeedLoader: Send + Sync {
    async fn load(&self, source: &FeedSource) -> Result<ParsedFeed>;
}

/// Always goes to the network.
pub struct DirectFetch {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
}

impl DirectFetch {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, normalizer: Normalizer) -> Self {
        Self {
            fetcher,
            normalizer,
        }
    }
}

#[async_trait]
impl FeedLoader for DirectFetch {
    async fn load(&self, source: &FeedSource) -> Result<ParsedFeed> {
        let body = self.fetcher.fetch(&source.url).await?;
        self.normalizer.normalize(&body)
    }
}

/// Serves the cached payload while it lives, otherwise fetches and caches.
pub struct CachedFetch {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    cache: Arc<FeedCache>,
}

impl CachedFetch {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        cache: Arc<FeedCache>,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            cache,
        }
    }
}

#[async_trait]
impl FeedLoader for CachedFetch {
    async fn load(&self, source: &FeedSource) -> Result<ParsedFeed> {
        if let Some(payload) = self.cache.load(&source.url) {
            info!("Loading '{}' from the cache", source.url);
            match self.normalizer.normalize(&payload.body) {
                Ok(feed) => return Ok(feed),
                Err(e) => warn!("Cached copy of '{}' does not parse: {}", source.url, e),
            }
        }

        let body = self.fetcher.fetch(&source.url).await?;
        let feed = self.normalizer.normalize(&body)?;

        info!("Caching the feed from '{}'", source.url);
        if let Err(e) = self
            .cache
            .store(&source.url, body, source.effective_ttl_minutes())
        {
            warn!("Caching '{}' failed: {}", source.url, e);
        }

        Ok(feed)
    }
}

/// Both strategies, built once and handed out per source.
#[derive(Clone)]
pub struct Loaders {
    direct: Arc<DirectFetch>,
    cached: Option<Arc<CachedFetch>>,
}

impl Loaders {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        normalizer: Normalizer,
        cache: Option<Arc<FeedCache>>,
    ) -> Self {
        let cached = cache.map(|cache| {
            Arc::new(CachedFetch::new(
                fetcher.clone(),
                normalizer.clone(),
                cache,
            ))
        });

        Self {
            direct: Arc::new(DirectFetch::new(fetcher, normalizer)),
            cached,
        }
    }

    /// The cached strategy when the source asks for it and a cache exists.
    pub fn for_source(&self, source: &FeedSource) -> Arc<dyn FeedLoader> {
        match (&self.cached, source.caching_enabled) {
            (Some(cached), true) => cached.clone(),
            _ => self.direct.clone(),
        }
    }
}
