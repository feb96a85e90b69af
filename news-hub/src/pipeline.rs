use crate::aggregators::TopicClusterer;
use crate::processing::{dedupe, filter_by_age, sort_items};
use crate::sources::adapter_for;
use crate::traits::Fetch;
use crate::types::{FeedDescriptor, FeedFailure, Item, PipelineOutput, Result, RunDefaults, RunSummary};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs one build: every feed through its adapter, then age filter, dedup,
/// sort and topic clustering.
pub struct IngestionPipeline {
    fetcher: Arc<dyn Fetch>,
    defaults: RunDefaults,
}

impl IngestionPipeline {
    pub fn new(fetcher: Arc<dyn Fetch>, defaults: RunDefaults) -> Self {
        Self { fetcher, defaults }
    }

    pub async fn run(&self, feeds: &[FeedDescriptor]) -> PipelineOutput {
        self.run_at(feeds, Utc::now()).await
    }

    /// Same as [`run`](Self::run) with an explicit clock, so ages and
    /// recency are reproducible.
    pub async fn run_at(&self, feeds: &[FeedDescriptor], now: DateTime<Utc>) -> PipelineOutput {
        info!("Starting build over {} feeds", feeds.len());

        let (items, failures) = self.ingest(feeds).await;
        let output = build_output(items, failures, &self.defaults, now);

        info!(
            "Generated: {} items, {} topics. Failures: {}",
            output.summary.count_items,
            output.summary.count_topics,
            output.summary.failures.len()
        );
        output
    }

    /// Fetches all feeds, up to `concurrency` at a time. Items come back in
    /// feed order regardless of which fetch finished first.
    pub async fn ingest(&self, feeds: &[FeedDescriptor]) -> (Vec<Item>, Vec<FeedFailure>) {
        let concurrency = self.defaults.concurrency.max(1);

        let outcomes: Vec<(&FeedDescriptor, Result<Vec<Item>>)> = stream::iter(feeds)
            .map(|feed| async move { (feed, self.ingest_feed(feed).await) })
            .buffered(concurrency)
            .collect()
            .await;

        let mut all_items = Vec::new();
        let mut failures = Vec::new();

        for (feed, outcome) in outcomes {
            match outcome {
                Ok(items) => {
                    info!("Feed {}: {} items", feed.id, items.len());
                    all_items.extend(items);
                }
                Err(e) => {
                    error!("Failed to ingest feed {} ({}): {}", feed.id, feed.url, e);
                    failures.push(FeedFailure {
                        feed: feed.id.clone(),
                        url: feed.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        (all_items, failures)
    }

    async fn ingest_feed(&self, feed: &FeedDescriptor) -> Result<Vec<Item>> {
        let kind = match feed.feed_kind() {
            Some(kind) => kind,
            None => {
                warn!("Feed {} has unsupported type {:?}; skipping", feed.id, feed.kind);
                return Ok(Vec::new());
            }
        };

        let adapter = adapter_for(kind);
        debug!("Feed {} handled by the {} adapter", feed.id, adapter.adapter_name());
        adapter
            .collect(feed, self.fetcher.as_ref(), self.defaults.max_items_per_feed)
            .await
    }
}

/// The deterministic half of a build: everything after the fetches.
pub fn build_output(
    items: Vec<Item>,
    failures: Vec<FeedFailure>,
    defaults: &RunDefaults,
    now: DateTime<Utc>,
) -> PipelineOutput {
    let pooled = items.len();
    let fresh = filter_by_age(items, defaults.max_age_days, now);
    let mut unique = dedupe(fresh);
    sort_items(&mut unique);

    let topics = TopicClusterer::new(defaults.top_k).cluster(&unique, now);

    info!(
        "Pool of {} items reduced to {} after age filter and dedup",
        pooled,
        unique.len()
    );

    let summary = RunSummary {
        generated_at: now,
        count_items: unique.len(),
        count_topics: topics.len(),
        failures,
    };

    PipelineOutput {
        items: unique,
        topics,
        summary,
    }
}
