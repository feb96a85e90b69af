use crate::rss_utils::url;
use crate::types::{FeedDescriptor, HubError, Result, RunDefaults};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Contents of `feeds.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedCatalog {
    #[serde(default)]
    pub defaults: RunDefaults,
    pub feeds: Vec<FeedDescriptor>,
}

/// Owns the feed definitions for one run.
pub struct FeedManager {
    catalog: FeedCatalog,
}

impl FeedManager {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manager = Self::from_json(&content)?;

        info!("Loaded {} feeds from {}", manager.feeds().len(), path.display());
        Ok(manager)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let catalog: FeedCatalog = serde_json::from_str(content)?;
        Self::new(catalog)
    }

    pub fn new(catalog: FeedCatalog) -> Result<Self> {
        validate(&catalog)?;
        Ok(Self { catalog })
    }

    pub fn feeds(&self) -> &[FeedDescriptor] {
        &self.catalog.feeds
    }

    pub fn defaults(&self) -> &RunDefaults {
        &self.catalog.defaults
    }

    pub fn into_parts(self) -> (RunDefaults, Vec<FeedDescriptor>) {
        (self.catalog.defaults, self.catalog.feeds)
    }
}

fn validate(catalog: &FeedCatalog) -> Result<()> {
    let mut seen_ids = HashSet::new();

    for feed in &catalog.feeds {
        if feed.id.trim().is_empty() {
            return Err(HubError::Config(format!("feed {:?} has an empty id", feed.name)));
        }
        if !feed.weight.is_finite() || feed.weight < 0.0 {
            return Err(HubError::Config(format!(
                "feed {} has invalid weight {}",
                feed.id, feed.weight
            )));
        }
        if !seen_ids.insert(feed.id.as_str()) {
            return Err(HubError::Config(format!("duplicate feed id {}", feed.id)));
        }
        if !url::is_valid_feed_url(&feed.url) {
            warn!("Feed {} has a suspicious URL: {}", feed.id, feed.url);
        }
        if feed.feed_kind().is_none() {
            warn!("Feed {} has unsupported type {:?}", feed.id, feed.kind);
        }
    }

    validate_defaults(&catalog.defaults)
}

/// Checks run knobs, whether they come from `feeds.json` or the command line.
pub fn validate_defaults(defaults: &RunDefaults) -> Result<()> {
    if defaults.max_age_days < 0 {
        return Err(HubError::Config("max_age_days must not be negative".to_string()));
    }
    if defaults.concurrency == 0 {
        return Err(HubError::Config("concurrency must be at least 1".to_string()));
    }

    Ok(())
}
