use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{FeedfsError, Result};
use crate::domain::{FeedItem, ParsedFeed};

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parses RSS, Atom or JSON Feed bytes.
    ///
    /// Titles are entity-decoded since they end up in file names. Bodies are
    /// left as markup for the renderer.
    pub fn normalize(&self, body: &[u8]) -> Result<ParsedFeed> {
        let feed = parser::parse(body).map_err(|e| FeedfsError::FeedParse(e.to_string()))?;

        let items = feed
            .entries
            .into_iter()
            .map(|entry| FeedItem {
                title: entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string()),
                link: entry.links.first().map(|l| l.href.clone()),
                content: entry.content.and_then(|c| c.body),
                summary: entry.summary.map(|s| s.content),
                updated: entry.updated,
                published: entry.published,
            })
            .collect();

        Ok(ParsedFeed {
            title: feed
                .title
                .map(|t| decode_html_entities(&t.content).to_string()),
            updated: feed.updated,
            published: feed.published,
            items,
        })
    }
}
