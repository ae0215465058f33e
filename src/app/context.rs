use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::app::error::{FeedfsError, Result};
use crate::cache::{CacheStore, FeedCache, SqliteCacheStore};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelLoader;
use crate::fetcher::{Fetcher, Loaders};
use crate::normalizer::Normalizer;
use crate::projection::{Projection, Renderer, TreeBuilder};

pub struct AppContext {
    pub config: Config,
    pub cache: Arc<FeedCache>,
    pub projection: Arc<Projection>,
}

impl AppContext {
    /// Wires the HTTP fetcher, the cache and the projection for `config`.
    ///
    /// With `persist_cache` the cache lives in the user cache directory,
    /// otherwise in memory.
    pub fn new(config: Config, persist_cache: bool) -> Result<Self> {
        let store: Arc<dyn CacheStore> = if persist_cache {
            Arc::new(SqliteCacheStore::new(Self::default_cache_path()?)?)
        } else {
            Arc::new(SqliteCacheStore::in_memory()?)
        };

        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        Self::from_parts(config, fetcher, store)
    }

    pub fn from_parts(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        let cache = Arc::new(FeedCache::new(store));
        let purged = cache.purge_expired()?;
        if purged > 0 {
            info!("Purged {} expired cache entries", purged);
        }

        let loaders = Loaders::new(fetcher, Normalizer::new(), Some(cache.clone()));
        let builder = TreeBuilder::new(
            ParallelLoader::with_workers(loaders, config.workers),
            Renderer::new(config.style.clone()),
        );
        let projection = Projection::new(builder, config.sources(), config.refresh)
            .with_rebuild_timeout(config.rebuild_timeout());

        Ok(Self {
            config,
            cache,
            projection: Arc::new(projection),
        })
    }

    /// Cancels pending cache expiry timers.
    pub fn shutdown(&self) {
        self.cache.shutdown();
    }

    fn default_cache_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| FeedfsError::Other("Could not find cache directory".into()))?;
        let feedfs_dir = cache_dir.join("feedfs");
        std::fs::create_dir_all(&feedfs_dir)?;
        Ok(feedfs_dir.join("cache.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedSource;
    use crate::fetcher::stub::{rss, StubFetcher};

    const URL: &str = "https://example.com/feed.xml";

    fn config(caching: bool) -> Config {
        let mut source = FeedSource::new(URL);
        source.caching_enabled = caching;
        Config {
            feeds: vec![Arc::new(source)],
            ..Config::default()
        }
    }

    fn context(config: Config, fetcher: Arc<StubFetcher>) -> AppContext {
        let store = Arc::new(SqliteCacheStore::in_memory().unwrap());
        AppContext::from_parts(config, fetcher, store).unwrap()
    }

    #[tokio::test]
    async fn test_cached_feed_is_fetched_once() {
        let fetcher = Arc::new(StubFetcher::new().with_feed(URL, &rss("Blog", &["One"])));
        let ctx = context(config(true), fetcher.clone());

        ctx.projection.rebuild().await.unwrap();
        ctx.projection.rebuild().await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(ctx.projection.lookup("/Blog/One.html").is_ok());
        assert_eq!(ctx.cache.pending_timers(), 1);

        ctx.shutdown();
        assert_eq!(ctx.cache.pending_timers(), 0);
    }

    #[tokio::test]
    async fn test_uncached_feed_is_fetched_every_build() {
        let fetcher = Arc::new(StubFetcher::new().with_feed(URL, &rss("Blog", &["One"])));
        let ctx = context(config(false), fetcher.clone());

        ctx.projection.rebuild().await.unwrap();
        ctx.projection.rebuild().await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(ctx.cache.pending_timers(), 0);
    }

    #[tokio::test]
    async fn test_style_reaches_rendered_items() {
        let fetcher = Arc::new(StubFetcher::new().with_feed(URL, &rss("Blog", &["One"])));
        let config = Config {
            style: Some("h1 { color: red }".into()),
            ..config(false)
        };
        let ctx = context(config, fetcher);

        ctx.projection.rebuild().await.unwrap();
        let content = ctx.projection.read_range("/Blog/One.html", 0, 7).unwrap();
        assert_eq!(content, b"<style>");
    }
}
