use crate::types::{FeedDescriptor, Item, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Transport used by the source adapters to pull raw documents.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url` and return its body as text. Any transport problem
    /// (timeout, DNS, non-success status) is an error.
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String>;

    /// Timeout for a feed's top-level document.
    fn feed_timeout(&self) -> Duration {
        Duration::from_secs(20)
    }

    /// Timeout for documents discovered through another one (child sitemaps).
    fn child_timeout(&self) -> Duration {
        Duration::from_secs(25)
    }
}

/// Turns one configured feed into normalized items.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs.
    fn adapter_name(&self) -> &'static str;

    /// Items in source-native order, at most `max_items` of them. An error
    /// means the feed as a whole could not be read.
    async fn collect(
        &self,
        feed: &FeedDescriptor,
        fetcher: &dyn Fetch,
        max_items: usize,
    ) -> Result<Vec<Item>>;
}
