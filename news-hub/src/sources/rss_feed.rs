use crate::parser::{entries_to_items, parse_feed_document};
use crate::traits::{Fetch, SourceAdapter};
use crate::types::{FeedDescriptor, Item, Result};
use async_trait::async_trait;
use tracing::info;

/// Generic syndication feed source (RSS, Atom, JSON Feed).
#[derive(Debug, Default, Clone, Copy)]
pub struct RssFeedSource;

impl RssFeedSource {
    pub fn new() -> Self {
        Self
    }

    /// Parses an already-fetched feed body.
    pub fn parse(&self, feed: &FeedDescriptor, content: &str, max_items: usize) -> Result<Vec<Item>> {
        let entries = parse_feed_document(content.as_bytes())?;
        let items = entries_to_items(feed, entries, max_items);

        info!("Feed {}: normalized {} items", feed.id, items.len());
        Ok(items)
    }
}

#[async_trait]
impl SourceAdapter for RssFeedSource {
    fn adapter_name(&self) -> &'static str {
        "rss"
    }

    async fn collect(
        &self,
        feed: &FeedDescriptor,
        fetcher: &dyn Fetch,
        max_items: usize,
    ) -> Result<Vec<Item>> {
        info!("Pulling feed {}: {}", feed.id, feed.url);

        let content = fetcher.fetch_text(&feed.url, fetcher.feed_timeout()).await?;
        self.parse(feed, &content, max_items)
    }
}
