#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use news_hub::{Fetch, FeedDescriptor, FeedKind, HubError, Item, Result};
use std::collections::HashMap;
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

/// Serves canned bodies by URL; anything unknown is a 404.
#[derive(Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<String>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for StaticFetcher {
    async fn fetch_text(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.bodies.get(url).cloned().ok_or_else(|| HubError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

/// Fixed clock used across the tests: 2024-05-02 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
}

pub fn rss_feed(id: &str, name: &str) -> FeedDescriptor {
    FeedDescriptor::new(id, name, &format!("https://{}.example/rss.xml", id), FeedKind::Rss)
}

pub fn item(source: &str, link: &str, title: &str, published: Option<DateTime<Utc>>) -> Item {
    Item::new(&rss_feed(source, source), link, title, "", published)
}

/// Minimal RSS 2.0 document with one `<item>` per (title, link, pubDate).
pub fn rss_document(entries: &[(&str, &str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(title, link, pub_date)| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate></item>",
                title, link, pub_date
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title><link>https://test.example/</link><description>Test feed</description>{}</channel></rss>"#,
        items
    )
}
