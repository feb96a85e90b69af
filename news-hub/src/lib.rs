pub mod aggregators;
pub mod digest;
pub mod feed_manager;
pub mod fetcher;
pub mod parser;
pub mod pipeline;
pub mod processing;
pub mod rss_utils;
pub mod sources;
pub mod traits;
pub mod types;

pub use aggregators::TopicClusterer;
pub use digest::write_digest;
pub use feed_manager::{FeedCatalog, FeedManager};
pub use fetcher::HttpFetcher;
pub use parser::RawEntry;
pub use pipeline::{build_output, IngestionPipeline};
pub use processing::{dedupe, filter_by_age, sort_items};
pub use sources::{NewsSitemapSource, RssFeedSource};
pub use traits::{Fetch, SourceAdapter};
pub use types::*;
