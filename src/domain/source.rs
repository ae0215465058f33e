use std::sync::Arc;

use serde::Deserialize;

/// TTL applied when a cached feed leaves `cache_mins` unset or zero.
pub const DEFAULT_CACHE_TTL_MINUTES: u32 = 60;

/// One configured feed URL plus its rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedSource {
    pub url: String,
    /// Render items as `.txt` instead of `.html`.
    #[serde(default, rename = "plaintext")]
    pub render_as_plain_text: bool,
    /// Put a link to the original article into each item.
    #[serde(default, rename = "showlink")]
    pub show_original_link: bool,
    #[serde(default, rename = "cache")]
    pub caching_enabled: bool,
    #[serde(default, rename = "cache_mins")]
    pub cache_ttl_minutes: u32,
}

impl FeedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            render_as_plain_text: false,
            show_original_link: false,
            caching_enabled: false,
            cache_ttl_minutes: 0,
        }
    }

    /// Effective cache TTL in minutes, zero meaning the default.
    pub fn effective_ttl_minutes(&self) -> u32 {
        if self.cache_ttl_minutes == 0 {
            DEFAULT_CACHE_TTL_MINUTES
        } else {
            self.cache_ttl_minutes
        }
    }
}

/// A named, ordered group of feeds projected as one directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default, rename = "feed")]
    pub feeds: Vec<Arc<FeedSource>>,
}

/// Everything one build pass projects: categories first, then the
/// standalone feeds that sit directly under the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sources {
    pub categories: Vec<Category>,
    pub feeds: Vec<Arc<FeedSource>>,
}

impl Sources {
    /// All feed sources in build order.
    pub fn iter_feeds(&self) -> impl Iterator<Item = &Arc<FeedSource>> {
        self.categories
            .iter()
            .flat_map(|c| c.feeds.iter())
            .chain(self.feeds.iter())
    }

    pub fn feed_count(&self) -> usize {
        self.iter_feeds().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_defaults_when_zero() {
        let source = FeedSource::new("https://example.com/feed.xml");
        assert_eq!(source.effective_ttl_minutes(), 60);
    }

    #[test]
    fn test_ttl_uses_configured_minutes() {
        let mut source = FeedSource::new("https://example.com/feed.xml");
        source.cache_ttl_minutes = 5;
        assert_eq!(source.effective_ttl_minutes(), 5);
    }

    #[test]
    fn test_iter_feeds_keeps_build_order() {
        let a = Arc::new(FeedSource::new("https://a.example/feed"));
        let b = Arc::new(FeedSource::new("https://b.example/feed"));
        let c = Arc::new(FeedSource::new("https://c.example/feed"));
        let sources = Sources {
            categories: vec![Category {
                name: "News".into(),
                feeds: vec![a, b],
            }],
            feeds: vec![c],
        };

        let urls: Vec<_> = sources.iter_feeds().map(|f| f.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://a.example/feed",
                "https://b.example/feed",
                "https://c.example/feed"
            ]
        );
        assert_eq!(sources.feed_count(), 3);
    }
}
