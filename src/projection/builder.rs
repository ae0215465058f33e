use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::app::Result;
use crate::domain::{
    resolve_timestamp, Entry, FeedItem, FeedSource, ParsedFeed, Sources, ROOT_INODE,
};
use crate::fetcher::parallel::ParallelLoader;
use crate::projection::names::{allocate_sorted, file_stem, DirectoryNames};
use crate::projection::render::Renderer;
use crate::projection::snapshot::{join_path, FeedFailure, Snapshot, Tree};

/// First inode handed out by a build; the root owns [`ROOT_INODE`].
pub const FIRST_INODE: u64 = ROOT_INODE + 1;

/// Inodes skipped after each feed directory.
pub const FEED_INODE_HEADROOM: u64 = 100;

/// Fetches every configured feed and projects it into a [`Snapshot`].
pub struct TreeBuilder {
    loader: ParallelLoader,
    renderer: Renderer,
}

impl TreeBuilder {
    pub fn new(loader: ParallelLoader, renderer: Renderer) -> Self {
        Self { loader, renderer }
    }

    pub async fn build(&self, sources: &Sources) -> Snapshot {
        self.build_at(sources, Utc::now()).await
    }

    /// Builds with `now` as the build time used for undated entries.
    pub async fn build_at(&self, sources: &Sources, now: DateTime<Utc>) -> Snapshot {
        let loaded = self
            .loader
            .load_all(sources.iter_feeds().cloned().collect())
            .await;

        let snapshot = self.assemble(sources, loaded, now);
        info!(
            "Projected {} feeds into {} entries ({} failed)",
            sources.feed_count() - snapshot.failures().len(),
            snapshot.len(),
            snapshot.failures().len()
        );
        snapshot
    }

    /// Lays out already loaded feeds.
    ///
    /// `loaded` must follow `sources.iter_feeds()` order.
    pub fn assemble(
        &self,
        sources: &Sources,
        loaded: Vec<(Arc<FeedSource>, Result<ParsedFeed>)>,
        now: DateTime<Utc>,
    ) -> Snapshot {
        let mut pass = BuildPass::new(&self.renderer, now);
        let mut loaded = loaded.into_iter();
        let mut root_names = DirectoryNames::default();
        let mut root_children = Vec::new();

        for category in &sources.categories {
            let name = root_names.claim(&file_stem(&category.name));
            let path = join_path("/", &name);

            let mut feed_names = DirectoryNames::default();
            let mut feed_dirs = Vec::with_capacity(category.feeds.len());
            for (source, result) in loaded.by_ref().take(category.feeds.len()) {
                if let Some(dir) = pass.project_feed(&path, &mut feed_names, &source, result) {
                    feed_dirs.push(dir);
                }
            }

            let timestamp = feed_dirs.iter().map(|d| d.timestamp).max().unwrap_or(now);
            pass.tree.insert(path, feed_dirs);

            let inode = pass.claim_inode();
            root_children.push(Arc::new(Entry::directory(name, inode, timestamp)));
        }

        for (source, result) in loaded {
            if let Some(dir) = pass.project_feed("/", &mut root_names, &source, result) {
                root_children.push(dir);
            }
        }

        pass.tree.insert("/".to_string(), root_children);
        Snapshot::from_tree(pass.tree, now, pass.failures, pass.fallbacks)
    }
}

/// Mutable state of one build.
struct BuildPass<'a> {
    renderer: &'a Renderer,
    now: DateTime<Utc>,
    next_inode: u64,
    tree: Tree,
    failures: Vec<FeedFailure>,
    fallbacks: usize,
}

impl<'a> BuildPass<'a> {
    fn new(renderer: &'a Renderer, now: DateTime<Utc>) -> Self {
        Self {
            renderer,
            now,
            next_inode: FIRST_INODE,
            tree: Tree::new(),
            failures: Vec::new(),
            fallbacks: 0,
        }
    }

    fn claim_inode(&mut self) -> u64 {
        let inode = self.next_inode;
        self.next_inode += 1;
        inode
    }

    fn timestamp(
        &mut self,
        updated: Option<DateTime<Utc>>,
        published: Option<DateTime<Utc>>,
        what: &str,
    ) -> DateTime<Utc> {
        let resolved = resolve_timestamp(updated, published, self.now);
        if resolved.fallback {
            self.fallbacks += 1;
            debug!("'{}' carries no date, using the build time", what);
        }
        resolved.at
    }

    /// Registers a feed's files and returns its directory entry.
    ///
    /// Items take consecutive inodes, the directory the next one, then the
    /// counter skips [`FEED_INODE_HEADROOM`].
    fn project_feed(
        &mut self,
        parent: &str,
        names: &mut DirectoryNames,
        source: &Arc<FeedSource>,
        loaded: Result<ParsedFeed>,
    ) -> Option<Arc<Entry>> {
        let feed = match loaded {
            Ok(feed) => feed,
            Err(e) => {
                warn!("Skipping feed '{}': {}", source.url, e);
                self.failures.push(FeedFailure {
                    url: source.url.clone(),
                    reason: e.to_string(),
                });
                return None;
            }
        };

        let title = feed.title.as_deref().unwrap_or(&source.url);
        let dir_name = names.claim(&file_stem(title));
        let dir_path = join_path(parent, &dir_name);

        let titles: Vec<&str> = feed.items.iter().map(FeedItem::display_title).collect();
        let mut files = Vec::with_capacity(titles.len());
        for (index, name) in allocate_sorted(&titles, Renderer::extension(source)) {
            let item = &feed.items[index];
            let rendered = self.renderer.render(item, source);
            let timestamp = self.timestamp(item.updated, item.published, item.display_title());
            let inode = self.claim_inode();
            files.push(Arc::new(Entry::file(
                name,
                inode,
                timestamp,
                rendered.content.into_bytes(),
            )));
        }

        let timestamp = self.timestamp(feed.updated, feed.published, title);
        let dir = Entry::directory(dir_name, self.next_inode, timestamp)
            .with_source_feed(source.clone());
        self.next_inode += FEED_INODE_HEADROOM;

        self.tree.insert(dir_path, files);
        Some(Arc::new(dir))
    }
}
