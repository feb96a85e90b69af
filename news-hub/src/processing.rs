use crate::rss_utils::{text, time, url};
use crate::types::Item;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::{debug, info};

/// Keeps items published within the last `max_age_days`. Items with no
/// known publication time are always kept, and so is everything when the
/// window reaches past the representable date range.
pub fn filter_by_age(items: Vec<Item>, max_age_days: i64, now: DateTime<Utc>) -> Vec<Item> {
    let cutoff = match Duration::try_days(max_age_days)
        .and_then(|window| now.checked_sub_signed(window))
    {
        Some(cutoff) => cutoff,
        None => {
            debug!("Age window of {} days is unbounded; keeping all items", max_age_days);
            return items;
        }
    };
    let before = items.len();

    let kept: Vec<Item> = items
        .into_iter()
        .filter(|item| match item.published {
            Some(published) => published >= cutoff,
            None => true,
        })
        .collect();

    debug!(
        "Age filter ({} days) dropped {} of {} items",
        max_age_days,
        before - kept.len(),
        before
    );
    kept
}

/// Identity of an article for dedup purposes: canonical link plus
/// lowercased, whitespace-collapsed title.
pub fn dedup_key(item: &Item) -> (String, String) {
    (
        url::canonicalize(&item.link),
        text::collapse_whitespace(&item.title).to_lowercase(),
    )
}

/// Drops every item whose key was already seen, regardless of source.
/// First occurrence wins and order is preserved.
pub fn dedupe(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    let before = items.len();

    let unique: Vec<Item> = items
        .into_iter()
        .filter(|item| {
            let fresh = seen.insert(dedup_key(item));
            if !fresh {
                debug!("Removing duplicate entry: {} ({})", item.title, item.link);
            }
            fresh
        })
        .collect();

    let removed_count = before - unique.len();
    if removed_count > 0 {
        info!("Removed {} duplicate entries", removed_count);
    }
    unique
}

/// Newest first, then heavier feeds first. Unknown dates count as the epoch.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| {
        let a_time = a.published.unwrap_or_else(time::epoch);
        let b_time = b.published.unwrap_or_else(time::epoch);
        b_time
            .cmp(&a_time)
            .then_with(|| b.weight.total_cmp(&a.weight))
    });
}
