pub mod http_fetcher;
pub mod parallel;
pub mod strategy;

use async_trait::async_trait;

use crate::app::Result;

pub use strategy::{CachedFetch, DirectFetch, FeedLoader, Loaders};

/// Retrieves the raw bytes of a feed.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
