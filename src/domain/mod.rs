pub mod entry;
pub mod feed;
pub mod source;

pub use entry::{Attributes, Entry, ROOT_INODE};
pub use feed::{resolve_timestamp, FeedItem, ParsedFeed, ResolvedTimestamp};
pub use source::{Category, FeedSource, Sources, DEFAULT_CACHE_TTL_MINUTES};
