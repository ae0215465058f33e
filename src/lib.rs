//! # feedfs
//!
//! Projects RSS/Atom feeds into a read-only file tree.
//!
//! ## Architecture
//!
//! ```text
//! Config → Fetcher (+ Cache) → Normalizer → TreeBuilder → Snapshot → Projection
//! ```
//!
//! Categories become directories under `/`, each feed a directory holding
//! one file per item. Items render to `.html`, or to `.txt` for feeds that
//! ask for plain text.
//!
//! - [`fetcher`]: HTTP client and per-feed fetch strategies
//! - [`cache`]: SQLite-backed payload cache with TTL expiry
//! - [`normalizer`]: Converts RSS/Atom feeds to unified domain models
//! - [`projection`]: Builds and publishes the tree
//!
//! ## Quick Start
//!
//! ```bash
//! # Print the whole tree
//! feedfs tree
//!
//! # List a category
//! feedfs ls /News
//!
//! # Read an item
//! feedfs cat "/News/LWN.net/Some headline.txt"
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// fetcher, cache, projection.
pub mod app;

/// Payload cache keyed by feed URL.
///
/// - [`FeedCache`](cache::FeedCache): TTL bookkeeping and expiry timers
/// - [`SqliteCacheStore`](cache::SqliteCacheStore): SQLite implementation
pub mod cache;

/// Command-line interface using clap.
///
/// - `tree` - Print the projected tree
/// - `ls [path]` - List a directory
/// - `cat <path>` - Read a file, optionally a byte range
/// - `stat <path>` - Show attributes
/// - `cache clear` - Drop cached feeds
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/feedfs/config.toml`: feeds, categories, item style
/// and refresh behavior.
pub mod config;

/// Core domain models.
///
/// - [`FeedSource`](domain::FeedSource): A configured feed and its options
/// - [`ParsedFeed`](domain::ParsedFeed): A fetched and parsed feed
/// - [`Entry`](domain::Entry): A file or directory of the tree
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelLoader`](fetcher::parallel::ParallelLoader): Concurrent loading with semaphore
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`ParsedFeed`](domain::ParsedFeed).
pub mod normalizer;

/// The projected tree and its read surface.
pub mod projection;
