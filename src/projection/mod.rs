//! The feed tree as a read-only filesystem.
//!
//! ```text
//! Sources → TreeBuilder → Snapshot → Projection (ArcSwap) → readers
//! ```
//!
//! A [`Snapshot`] is immutable. Rebuilding produces a new one which replaces
//! the published snapshot in a single swap, so a reader holding an
//! `Arc<Snapshot>` keeps a consistent generation for as long as it likes.

pub mod builder;
pub mod names;
pub mod render;
pub mod snapshot;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::app::{FeedfsError, Result};
use crate::domain::{Entry, Sources};

pub use builder::TreeBuilder;
pub use render::{Renderer, LINE_BREAK};
pub use snapshot::{normalize_path, FeedFailure, Snapshot};

/// Which directory listings rebuild the whole tree first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Only explicit rebuilds.
    Never,
    /// Listing `/`.
    #[default]
    RootListing,
    /// Any listing.
    EveryListing,
}

impl RefreshPolicy {
    pub fn refreshes(&self, path: &str) -> bool {
        match self {
            RefreshPolicy::Never => false,
            RefreshPolicy::RootListing => normalize_path(path) == "/",
            RefreshPolicy::EveryListing => true,
        }
    }
}

/// The currently published snapshot and the means to replace it.
pub struct Projection {
    current: ArcSwap<Snapshot>,
    builder: TreeBuilder,
    sources: Sources,
    policy: RefreshPolicy,
    rebuild_timeout: Option<Duration>,
    rebuild_lock: Mutex<()>,
}

impl Projection {
    pub fn new(builder: TreeBuilder, sources: Sources, policy: RefreshPolicy) -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty(Utc::now())),
            builder,
            sources,
            policy,
            rebuild_timeout: None,
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Rebuilds running longer than `timeout` are dropped.
    pub fn with_rebuild_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.rebuild_timeout = timeout;
        self
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation()
    }

    /// Builds a new generation and publishes it.
    ///
    /// Concurrent callers share one build: whoever waited on the lock while
    /// another rebuild completed gets that result.
    pub async fn rebuild(&self) -> Result<Arc<Snapshot>> {
        let seen = self.generation();
        let _guard = self.rebuild_lock.lock().await;
        if self.generation() != seen {
            return Ok(self.snapshot());
        }

        let build = self.builder.build(&self.sources);
        let snapshot = match self.rebuild_timeout {
            Some(limit) => tokio::time::timeout(limit, build)
                .await
                .map_err(|_| FeedfsError::RebuildTimedOut(limit.as_secs()))?,
            None => build.await,
        };

        let snapshot = Arc::new(snapshot.with_generation(seen + 1));
        self.current.store(snapshot.clone());
        info!(
            "Published generation {} ({} entries)",
            snapshot.generation(),
            snapshot.len()
        );

        Ok(snapshot)
    }

    pub fn lookup(&self, path: &str) -> Result<Arc<Entry>> {
        self.snapshot()
            .lookup(path)
            .cloned()
            .ok_or_else(|| FeedfsError::NotFound(path.to_string()))
    }

    /// Lists a directory, rebuilding first when the policy says so.
    ///
    /// A failed rebuild is logged and the listing comes from the current
    /// generation.
    pub async fn list_children(&self, path: &str) -> Result<Vec<Arc<Entry>>> {
        if self.policy.refreshes(path) {
            if let Err(e) = self.rebuild().await {
                warn!("Refreshing before listing {} failed: {}", path, e);
            }
        }

        self.snapshot()
            .list_children(path)
            .map(<[Arc<Entry>]>::to_vec)
            .ok_or_else(|| FeedfsError::NotFound(path.to_string()))
    }

    pub fn read_range(&self, path: &str, offset: u64, length: usize) -> Result<Vec<u8>> {
        self.snapshot()
            .read_range(path, offset, length)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| FeedfsError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, FeedSource};
    use crate::fetcher::parallel::ParallelLoader;
    use crate::fetcher::stub::{rss, StubFetcher};
    use crate::fetcher::Loaders;
    use crate::normalizer::Normalizer;

    const URL: &str = "https://example.com/feed.xml";

    fn projection(fetcher: Arc<StubFetcher>, policy: RefreshPolicy) -> Projection {
        let loaders = Loaders::new(fetcher, Normalizer::new(), None);
        let builder = TreeBuilder::new(ParallelLoader::new(loaders), Renderer::default());
        let sources = Sources {
            categories: vec![Category {
                name: "News".into(),
                feeds: vec![Arc::new(FeedSource::new(URL))],
            }],
            feeds: Vec::new(),
        };
        Projection::new(builder, sources, policy)
    }

    fn stub(items: &[&str]) -> Arc<StubFetcher> {
        Arc::new(StubFetcher::new().with_feed(URL, &rss("Blog", items)))
    }

    #[test]
    fn test_refresh_policy() {
        assert!(RefreshPolicy::RootListing.refreshes("/"));
        assert!(RefreshPolicy::RootListing.refreshes(""));
        assert!(!RefreshPolicy::RootListing.refreshes("/News"));
        assert!(RefreshPolicy::EveryListing.refreshes("/News"));
        assert!(!RefreshPolicy::Never.refreshes("/"));
    }

    #[test]
    fn test_root_exists_before_first_build() {
        let projection = projection(stub(&[]), RefreshPolicy::Never);
        assert_eq!(projection.generation(), 0);
        assert_eq!(projection.lookup("/").unwrap().inode, 1001);
        assert!(matches!(
            projection.lookup("/News"),
            Err(FeedfsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rebuild_publishes_new_generation() {
        let projection = projection(stub(&["One"]), RefreshPolicy::Never);

        let old = projection.snapshot();
        let new = projection.rebuild().await.unwrap();

        assert_eq!(new.generation(), 1);
        assert_eq!(projection.generation(), 1);
        // Readers of the old generation keep their view.
        assert!(old.lookup("/News").is_none());
        assert!(new.lookup("/News/Blog/One.html").is_some());
    }

    #[tokio::test]
    async fn test_root_listing_refreshes() {
        let fetcher = stub(&["One"]);
        let projection = projection(fetcher.clone(), RefreshPolicy::RootListing);

        let root = projection.list_children("/").await.unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(fetcher.calls(), 1);

        fetcher.set_feed(URL, &rss("Blog", &["One", "Two"]));
        projection.list_children("/News/Blog").await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(projection.list_children("/News/Blog").await.unwrap().len(), 1);

        projection.list_children("/").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(projection.list_children("/News/Blog").await.unwrap().len(), 2);
        assert_eq!(projection.generation(), 2);
    }

    #[tokio::test]
    async fn test_every_listing_refreshes() {
        let fetcher = stub(&["One"]);
        let projection = projection(fetcher.clone(), RefreshPolicy::EveryListing);

        projection.list_children("/").await.unwrap();
        projection.list_children("/News").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_paths_are_not_found() {
        let projection = projection(stub(&["One"]), RefreshPolicy::Never);
        projection.rebuild().await.unwrap();

        assert!(matches!(
            projection.list_children("/Nope").await,
            Err(FeedfsError::NotFound(_))
        ));
        assert!(matches!(
            projection.read_range("/Nope", 0, 10),
            Err(FeedfsError::NotFound(_))
        ));

        let content = projection.read_range("/News/Blog/One.html", 0, 4).unwrap();
        assert_eq!(content, b"<h1>");
    }

    #[tokio::test]
    async fn test_listed_children_resolve_to_same_entry() {
        let projection = projection(stub(&["One", "Two"]), RefreshPolicy::Never);
        let snapshot = projection.rebuild().await.unwrap();

        for dir in ["/", "/News", "/News/Blog"] {
            for child in snapshot.list_children(dir).unwrap() {
                let path = snapshot::join_path(dir, &child.name);
                assert!(Arc::ptr_eq(snapshot.lookup(&path).unwrap(), child));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_rebuild_keeps_previous_generation() {
        use async_trait::async_trait;
        use crate::fetcher::Fetcher;

        struct SlowFetcher;

        #[async_trait]
        impl Fetcher for SlowFetcher {
            async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(rss("Blog", &["Late"]).into_bytes())
            }
        }

        let loaders = Loaders::new(Arc::new(SlowFetcher), Normalizer::new(), None);
        let builder = TreeBuilder::new(ParallelLoader::new(loaders), Renderer::default());
        let sources = Sources {
            categories: Vec::new(),
            feeds: vec![Arc::new(FeedSource::new(URL))],
        };
        let projection = Projection::new(builder, sources, RefreshPolicy::RootListing)
            .with_rebuild_timeout(Some(Duration::from_secs(5)));

        assert!(matches!(
            projection.rebuild().await,
            Err(FeedfsError::RebuildTimedOut(5))
        ));
        assert_eq!(projection.generation(), 0);

        // The listing still answers from the previous generation.
        assert!(projection.list_children("/").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_after_timeout_is_not_starved() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use async_trait::async_trait;
        use crate::fetcher::Fetcher;

        /// Hangs on the first request only.
        #[derive(Default)]
        struct StallOnce {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl Fetcher for StallOnce {
            async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                Ok(rss("Blog", &["One"]).into_bytes())
            }
        }

        let fetcher = Arc::new(StallOnce::default());
        let loaders = Loaders::new(fetcher.clone(), Normalizer::new(), None);
        let builder = TreeBuilder::new(ParallelLoader::with_workers(loaders, 1), Renderer::default());
        let sources = Sources {
            categories: Vec::new(),
            feeds: vec![Arc::new(FeedSource::new(URL))],
        };
        let projection = Projection::new(builder, sources, RefreshPolicy::Never)
            .with_rebuild_timeout(Some(Duration::from_secs(5)));

        assert!(matches!(
            projection.rebuild().await,
            Err(FeedfsError::RebuildTimedOut(5))
        ));

        // The abandoned load gave its worker slot back.
        let snapshot = projection.rebuild().await.unwrap();
        assert_eq!(snapshot.generation(), 1);
        assert!(snapshot.lookup("/Blog/One.html").is_some());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
