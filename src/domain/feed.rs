use chrono::{DateTime, Utc};

/// A fetched and parsed feed, reduced to what the projection needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub published: Option<DateTime<Utc>>,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Get the best available body markup
    pub fn body(&self) -> &str {
        self.content
            .as_deref()
            .or(self.summary.as_deref())
            .unwrap_or("")
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref().filter(|l| !l.is_empty())
    }
}

/// A timestamp picked from optional feed dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub at: DateTime<Utc>,
    /// Neither date was present and `at` is the build time.
    pub fallback: bool,
}

/// Picks `updated`, then `published`, then `now`.
pub fn resolve_timestamp(
    updated: Option<DateTime<Utc>>,
    published: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ResolvedTimestamp {
    match updated.or(published) {
        Some(at) => ResolvedTimestamp {
            at,
            fallback: false,
        },
        None => ResolvedTimestamp {
            at: now,
            fallback: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_resolve_prefers_updated() {
        let resolved = resolve_timestamp(Some(at(2)), Some(at(1)), at(9));
        assert_eq!(resolved.at, at(2));
        assert!(!resolved.fallback);
    }

    #[test]
    fn test_resolve_falls_back_to_published() {
        let resolved = resolve_timestamp(None, Some(at(1)), at(9));
        assert_eq!(resolved.at, at(1));
        assert!(!resolved.fallback);
    }

    #[test]
    fn test_resolve_flags_build_time_fallback() {
        let resolved = resolve_timestamp(None, None, at(9));
        assert_eq!(resolved.at, at(9));
        assert!(resolved.fallback);
    }

    #[test]
    fn test_body_prefers_content() {
        let item = FeedItem {
            content: Some("<p>full</p>".into()),
            summary: Some("short".into()),
            ..Default::default()
        };
        assert_eq!(item.body(), "<p>full</p>");
    }

    #[test]
    fn test_body_falls_back_to_summary() {
        let item = FeedItem {
            summary: Some("short".into()),
            ..Default::default()
        };
        assert_eq!(item.body(), "short");
        assert_eq!(FeedItem::default().body(), "");
    }

    #[test]
    fn test_empty_link_is_absent() {
        let item = FeedItem {
            link: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(item.link(), None);
        assert_eq!(item.display_title(), "Untitled");
    }
}
