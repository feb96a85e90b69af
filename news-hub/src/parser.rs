use crate::rss_utils::time;
use crate::types::{FeedDescriptor, HubError, Item, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use std::collections::HashMap;
use tracing::{debug, info};

/// Textual date fields, most trusted first. Entries converted from feed-rs
/// never carry these: it has already parsed the dates into the structured
/// keys below. They apply to entries assembled field by field.
pub const DATE_TEXT_KEYS: &[&str] = &["published", "updated", "created", "pubDate"];
/// Already-structured date fields, tried when no textual field parses.
pub const DATE_PARSED_KEYS: &[&str] = &["published_parsed", "updated_parsed"];
pub const SUMMARY_KEYS: &[&str] = &["summary", "description", "subtitle"];

/// Dialect-neutral view of one feed entry: field name to value.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    fields: HashMap<String, String>,
    times: HashMap<String, DateTime<Utc>>,
}

impl RawEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Empty values are not recorded.
    pub fn with_field(mut self, key: &str, value: Option<String>) -> Self {
        self.set_field(key, value);
        self
    }

    pub fn with_time(mut self, key: &str, value: Option<DateTime<Utc>>) -> Self {
        if let Some(value) = value {
            self.times.insert(key.to_string(), value);
        }
        self
    }

    pub fn set_field(&mut self, key: &str, value: Option<String>) {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                self.fields.insert(key.to_string(), value);
            }
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// First present, non-empty value among `keys`.
    pub fn first_field(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.field(key))
    }

    /// Textual date fields first (first one that parses wins), then the
    /// structured ones.
    pub fn resolve_published(&self) -> Option<DateTime<Utc>> {
        DATE_TEXT_KEYS
            .iter()
            .filter_map(|key| self.field(key))
            .find_map(time::parse_date_text)
            .or_else(|| {
                DATE_PARSED_KEYS
                    .iter()
                    .find_map(|key| self.times.get(*key).copied())
            })
    }

    pub fn resolve_summary(&self) -> &str {
        self.first_field(SUMMARY_KEYS).unwrap_or("")
    }

    /// Turns the entry into an item, or `None` when it has no link.
    pub fn into_item(self, feed: &FeedDescriptor) -> Option<Item> {
        let link = match self.field("link") {
            Some(link) => link.trim(),
            None => {
                debug!("Skipping entry without link in feed {}", feed.id);
                return None;
            }
        };

        Some(Item::new(
            feed,
            link,
            self.field("title").unwrap_or(""),
            self.resolve_summary(),
            self.resolve_published(),
        ))
    }
}

/// feed-rs hands over dates already parsed, so only `published_parsed` and
/// `updated_parsed` are filled here.
impl From<feed_rs::model::Entry> for RawEntry {
    fn from(entry: feed_rs::model::Entry) -> Self {
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
            .or_else(|| entry.links.first())
            .map(|l| l.href.clone());

        RawEntry::new()
            .with_field("link", link)
            .with_field("title", entry.title.map(|t| t.content))
            .with_field("summary", entry.summary.map(|s| s.content))
            .with_field("description", entry.content.and_then(|c| c.body))
            .with_time("published_parsed", entry.published)
            .with_time("updated_parsed", entry.updated)
    }
}

/// Parses an RSS/Atom/JSON feed body into raw entries, keeping document order.
pub fn parse_feed_document(content: &[u8]) -> Result<Vec<RawEntry>> {
    debug!("Parsing feed content ({} bytes)", content.len());

    let feed = parser::parse(content)
        .map_err(|e| HubError::Parse(format!("Failed to parse feed: {}", e)))?;

    let entries: Vec<RawEntry> = feed.entries.into_iter().map(RawEntry::from).collect();
    info!("Parsed feed with {} entries", entries.len());
    Ok(entries)
}

/// Normalizes the first `max_items` entries of a feed. Entries that cannot
/// become items are dropped one by one.
pub fn entries_to_items(feed: &FeedDescriptor, entries: Vec<RawEntry>, max_items: usize) -> Vec<Item> {
    entries
        .into_iter()
        .take(max_items)
        .filter_map(|entry| entry.into_item(feed))
        .collect()
}
