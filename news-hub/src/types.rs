use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rss_utils::{text, url};

pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const SUMMARY_MAX_CHARS: usize = 600;

/// A configured news source, as listed in `feeds.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedDescriptor {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_kind() -> String {
    "rss".to_string()
}

fn default_region() -> String {
    "Global".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

impl FeedDescriptor {
    pub fn new(id: &str, name: &str, url: &str, kind: FeedKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            kind: kind.tag().to_string(),
            region: default_region(),
            lang: default_lang(),
            tags: Vec::new(),
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_locale(mut self, region: &str, lang: &str) -> Self {
        self.region = region.to_string();
        self.lang = lang.to_string();
        self
    }

    pub fn feed_kind(&self) -> Option<FeedKind> {
        FeedKind::from_tag(&self.kind)
    }
}

/// Which source adapter understands a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// RSS, Atom or JSON Feed documents.
    Rss,
    /// A Google News sitemap index (the Reuters layout).
    NewsSitemapIndex,
}

impl FeedKind {
    pub fn tag(&self) -> &'static str {
        match self {
            FeedKind::Rss => "rss",
            FeedKind::NewsSitemapIndex => "reuters_news_sitemap_index",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rss" => Some(FeedKind::Rss),
            "reuters_news_sitemap_index" => Some(FeedKind::NewsSitemapIndex),
            _ => None,
        }
    }
}

/// One normalized article. Built once by a source adapter and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub source_id: String,
    #[serde(rename = "source")]
    pub source_name: String,
    pub region: String,
    pub lang: String,
    pub tags: Vec<String>,
    pub weight: f64,
    pub summary: String,
}

impl Item {
    /// Builds an item for `feed`. The link is canonicalized, the title and
    /// summary are HTML-stripped and the summary is capped.
    pub fn new(
        feed: &FeedDescriptor,
        link: &str,
        title: &str,
        summary: &str,
        published: Option<DateTime<Utc>>,
    ) -> Self {
        Self::assemble(feed, link, text::strip_html(title), text::strip_html(summary), published)
    }

    /// Same as [`Item::new`] for text that was already entity-decoded (XML
    /// character data), so `&amp;` written literally survives.
    pub fn from_unescaped(
        feed: &FeedDescriptor,
        link: &str,
        title: &str,
        summary: &str,
        published: Option<DateTime<Utc>>,
    ) -> Self {
        Self::assemble(feed, link, text::strip_tags(title), text::strip_tags(summary), published)
    }

    fn assemble(
        feed: &FeedDescriptor,
        link: &str,
        title: String,
        summary: String,
        published: Option<DateTime<Utc>>,
    ) -> Self {
        let link = url::canonicalize(link.trim());
        Self {
            id: text::content_id(&format!("{}|{}", feed.id, link)),
            title,
            link,
            published,
            source_id: feed.id.clone(),
            source_name: feed.name.clone(),
            region: feed.region.clone(),
            lang: feed.lang.clone(),
            tags: feed.tags.clone(),
            weight: sanitize_weight(feed.weight),
            summary: text::truncate_chars(&summary, SUMMARY_MAX_CHARS),
        }
    }

    pub fn with_extra_tag(mut self, tag: &str) -> Self {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
        self
    }
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight >= 0.0 {
        weight
    } else {
        DEFAULT_WEIGHT
    }
}

/// A ranked group of items covering the same story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub headline: String,
    pub count: usize,
    pub sources: Vec<String>,
    #[serde(rename = "items")]
    pub members: Vec<String>,
    /// Feeds into the score; not part of `topics.json`.
    #[serde(skip_serializing, default)]
    pub max_weight: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedFailure {
    pub feed: String,
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub count_items: usize,
    pub count_topics: usize,
    pub failures: Vec<FeedFailure>,
}

/// Everything one build produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub items: Vec<Item>,
    pub topics: Vec<Topic>,
    pub summary: RunSummary,
}

/// Per-run knobs, read from the `defaults` block of `feeds.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    pub max_age_days: i64,
    pub max_items_per_feed: usize,
    pub top_k: usize,
    pub concurrency: usize,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            max_items_per_feed: 40,
            top_k: 10,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub child_timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-hub/1.0 (personal RSS aggregation)".to_string(),
            timeout_seconds: 20,
            child_timeout_seconds: 25,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid feed configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HubError>;
