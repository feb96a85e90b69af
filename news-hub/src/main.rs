use anyhow::Context;
use clap::Parser;
use news_hub::feed_manager::validate_defaults;
use news_hub::{write_digest, FeedManager, FetchConfig, HttpFetcher, IngestionPipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Build the item and topic digests from the configured feeds.
#[derive(Debug, Parser)]
#[command(name = "news-hub", version, about)]
struct Args {
    /// Feed definitions file
    #[arg(long, default_value = "data/feeds.json")]
    feeds: PathBuf,

    /// Directory receiving items.json, topics.json and meta.json
    #[arg(long, default_value = "data")]
    out: PathBuf,

    #[arg(long)]
    max_age_days: Option<i64>,

    #[arg(long)]
    max_items_per_feed: Option<usize>,

    #[arg(long)]
    top_k: Option<usize>,

    /// Feeds fetched in parallel
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout for top-level feed documents, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let manager = FeedManager::load(&args.feeds)
        .with_context(|| format!("loading feed definitions from {}", args.feeds.display()))?;
    let (mut defaults, feeds) = manager.into_parts();

    if let Some(days) = args.max_age_days {
        defaults.max_age_days = days;
    }
    if let Some(max_items) = args.max_items_per_feed {
        defaults.max_items_per_feed = max_items;
    }
    if let Some(top_k) = args.top_k {
        defaults.top_k = top_k;
    }
    if let Some(concurrency) = args.concurrency {
        defaults.concurrency = concurrency;
    }
    validate_defaults(&defaults).context("invalid command-line override")?;

    let mut fetch_config = FetchConfig::default();
    if let Some(timeout) = args.timeout_secs {
        fetch_config.timeout_seconds = timeout;
    }

    let fetcher = HttpFetcher::new(fetch_config).context("building HTTP client")?;
    let pipeline = IngestionPipeline::new(Arc::new(fetcher), defaults);

    let output = pipeline.run(&feeds).await;

    write_digest(&args.out, &output)
        .with_context(|| format!("writing digest to {}", args.out.display()))?;

    info!("Digest written to {}", args.out.display());
    println!(
        "Generated: {} items, {} topics. Failures: {}",
        output.summary.count_items,
        output.summary.count_topics,
        output.summary.failures.len()
    );
    Ok(())
}
