mod common;

use common::{init_tracing, now, rss_document, rss_feed, StaticFetcher};
use news_hub::digest::{ITEMS_FILE, META_FILE, TOPICS_FILE};
use news_hub::{write_digest, FeedDescriptor, IngestionPipeline, RunDefaults};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

const PUB_DATE: &str = "Thu, 02 May 2024 10:00:00 GMT";

fn three_feed_fixture() -> (Vec<FeedDescriptor>, StaticFetcher) {
    let a = rss_feed("a", "Source A");
    let b = rss_feed("b", "Source B");
    let c = rss_feed("c", "Source C");

    let fetcher = StaticFetcher::new()
        .with_body(
            &a.url,
            rss_document(&[("Market rallies on rate cut hope", "https://a.example/markets/1", PUB_DATE)]),
        )
        .with_body(
            &b.url,
            rss_document(&[("Market rallies on rate-cut hopes", "https://b.example/markets/9", PUB_DATE)]),
        )
        .with_body(
            &c.url,
            rss_document(&[("Unrelated sports result", "https://c.example/sport/3", PUB_DATE)]),
        );

    (vec![a, b, c], fetcher)
}

#[tokio::test]
async fn test_three_feeds_cluster_into_two_topics() {
    init_tracing();

    let (feeds, fetcher) = three_feed_fixture();
    let pipeline = IngestionPipeline::new(Arc::new(fetcher), RunDefaults::default());
    let output = pipeline.run_at(&feeds, now()).await;

    info!(
        "Pipeline produced {} items and {} topics",
        output.items.len(),
        output.topics.len()
    );

    assert_eq!(output.items.len(), 3);
    assert_eq!(output.topics.len(), 2);
    assert!(output.summary.failures.is_empty());
    assert_eq!(output.summary.count_items, 3);
    assert_eq!(output.summary.count_topics, 2);
    assert_eq!(output.summary.generated_at, now());

    let lead = &output.topics[0];
    assert_eq!(lead.count, 2);
    assert_eq!(lead.sources, vec!["Source A".to_string(), "Source B".to_string()]);
    assert!(lead.score > output.topics[1].score);
    assert_eq!(output.topics[1].headline, "Unrelated sports result");
}

#[tokio::test]
async fn test_failed_feed_is_recorded_and_others_survive() {
    init_tracing();

    let (mut feeds, fetcher) = three_feed_fixture();
    feeds.push(rss_feed("down", "Down Feed"));
    let mut unknown = rss_feed("odd", "Odd Feed");
    unknown.kind = "podcast".to_string();
    feeds.push(unknown);

    let pipeline = IngestionPipeline::new(Arc::new(fetcher), RunDefaults::default());
    let output = pipeline.run_at(&feeds, now()).await;

    assert_eq!(output.items.len(), 3);
    assert_eq!(output.summary.failures.len(), 1);

    let failure = &output.summary.failures[0];
    assert_eq!(failure.feed, "down");
    assert_eq!(failure.url, "https://down.example/rss.xml");
    assert!(failure.error.contains("404"));
}

#[tokio::test]
async fn test_duplicate_story_across_feeds_kept_once() {
    init_tracing();

    let a = rss_feed("a", "Source A");
    let b = rss_feed("b", "Source B");
    let fetcher = StaticFetcher::new()
        .with_body(
            &a.url,
            rss_document(&[("Shared story", "https://wire.example/story?utm_source=a", PUB_DATE)]),
        )
        .with_body(
            &b.url,
            rss_document(&[("Shared  Story", "https://wire.example/story?utm_source=b", PUB_DATE)]),
        );

    let defaults = RunDefaults {
        concurrency: 1,
        ..RunDefaults::default()
    };
    let output = IngestionPipeline::new(Arc::new(fetcher), defaults)
        .run_at(&[a, b], now())
        .await;

    assert_eq!(output.items.len(), 1);
    assert_eq!(output.items[0].source_id, "a");
    assert_eq!(output.items[0].link, "https://wire.example/story");
}

#[tokio::test]
async fn test_digest_files_are_written() {
    init_tracing();

    let (feeds, fetcher) = three_feed_fixture();
    let output = IngestionPipeline::new(Arc::new(fetcher), RunDefaults::default())
        .run_at(&feeds, now())
        .await;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let out_dir = std::env::temp_dir().join(format!("news-hub-test-{}-{}", std::process::id(), nanos));

    let written = write_digest(&out_dir, &output).unwrap();
    assert_eq!(written.len(), 3);

    let read = |name: &str| -> serde_json::Value {
        let content = std::fs::read_to_string(out_dir.join(name)).unwrap();
        serde_json::from_str(&content).unwrap()
    };

    let items = read(ITEMS_FILE);
    assert_eq!(items.as_array().unwrap().len(), 3);
    assert_eq!(items[0]["source"], "Source A");

    let topics = read(TOPICS_FILE);
    assert_eq!(topics[0]["items"].as_array().unwrap().len(), 2);
    assert_eq!(topics[0]["count"], 2);
    assert_eq!(topics[0].as_object().unwrap().len(), 6);
    assert!(topics[0].get("max_weight").is_none());

    let meta = read(META_FILE);
    assert_eq!(meta["count_items"], 3);
    assert_eq!(meta["count_topics"], 2);
    assert!(meta["failures"].as_array().unwrap().is_empty());

    std::fs::remove_dir_all(&out_dir).ok();
}
