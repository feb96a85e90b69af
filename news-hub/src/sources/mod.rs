pub mod news_sitemap;
pub mod rss_feed;

pub use news_sitemap::NewsSitemapSource;
pub use rss_feed::RssFeedSource;

use crate::traits::SourceAdapter;
use crate::types::FeedKind;

/// The adapter that understands feeds of `kind`.
pub fn adapter_for(kind: FeedKind) -> Box<dyn SourceAdapter> {
    match kind {
        FeedKind::Rss => Box::new(RssFeedSource::new()),
        FeedKind::NewsSitemapIndex => Box::new(NewsSitemapSource::new()),
    }
}
