use crate::rss_utils::{text, time};
use crate::types::{Item, Topic};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Minimum Jaccard similarity for an item to join an existing cluster.
pub const SIMILARITY_THRESHOLD: f64 = 0.55;
/// Recency used when no member has a timestamp.
pub const NEUTRAL_RECENCY: f64 = 0.6;
/// Age (hours) at which recency has decayed to one half.
pub const RECENCY_HALF_LIFE_HOURS: f64 = 12.0;
/// Cap on sources and member ids listed per topic.
pub const MAX_LISTED: usize = 10;

static WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9\x{4e00}-\x{9fff}]+").expect("word pattern"));

/// Lowercased alphanumeric (Latin or CJK) runs of two or more characters.
pub fn tokenize(title: &str) -> HashSet<String> {
    let lowered = title.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

/// |a ∩ b| / |a ∪ b|, or 0 when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// `1 / (1 + age_hours / 12)` for the newest member, or the neutral value.
pub fn recency(newest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match newest {
        Some(newest) => 1.0 / (1.0 + time::age_hours(newest, now) / RECENCY_HALF_LIFE_HOURS),
        None => NEUTRAL_RECENCY,
    }
}

pub fn cluster_score(
    count: usize,
    diversity: usize,
    newest: Option<DateTime<Utc>>,
    max_weight: f64,
    now: DateTime<Utc>,
) -> f64 {
    let spread = 1.0 + 0.25 * (diversity as f64 - 1.0);
    count as f64 * spread * recency(newest, now) * (0.9 + 0.1 * max_weight)
}

/// A topic under construction. Owned by the clustering pass.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub id: String,
    pub headline: String,
    pub tokens: HashSet<String>,
    pub members: Vec<String>,
    pub sources: BTreeSet<String>,
    pub max_weight: f64,
    pub newest: Option<DateTime<Utc>>,
}

impl Cluster {
    fn found(item: &Item, tokens: HashSet<String>) -> Self {
        Self {
            id: topic_id(&item.title),
            headline: item.title.clone(),
            tokens,
            members: vec![item.id.clone()],
            sources: BTreeSet::from([item.source_name.clone()]),
            max_weight: item.weight,
            newest: item.published,
        }
    }

    fn absorb(&mut self, item: &Item, tokens: HashSet<String>) {
        self.members.push(item.id.clone());
        self.sources.insert(item.source_name.clone());
        self.max_weight = self.max_weight.max(item.weight);
        self.newest = self.newest.max(item.published);

        if item.title.chars().count() > self.headline.chars().count() {
            self.headline = item.title.clone();
            self.tokens = tokens;
        }
    }

    pub fn score(&self, now: DateTime<Utc>) -> f64 {
        cluster_score(
            self.members.len(),
            self.sources.len(),
            self.newest,
            self.max_weight,
            now,
        )
    }

    fn into_topic(self, score: f64) -> Topic {
        Topic {
            id: self.id,
            headline: self.headline,
            count: self.members.len(),
            sources: self.sources.into_iter().take(MAX_LISTED).collect(),
            members: self.members.into_iter().take(MAX_LISTED).collect(),
            max_weight: self.max_weight,
            score: (score * 10_000.0).round() / 10_000.0,
        }
    }
}

/// First 12 hex characters of the hash of the founding headline.
pub fn topic_id(headline: &str) -> String {
    text::content_id(&format!("topic|{}", headline))[..12].to_string()
}

/// Greedy single-pass clustering of headlines, in item order.
#[derive(Debug, Clone)]
pub struct TopicClusterer {
    threshold: f64,
    top_k: usize,
}

impl TopicClusterer {
    pub fn new(top_k: usize) -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
            top_k,
        }
    }

    /// Each item joins the first cluster (in creation order) whose
    /// representative tokens are similar enough, or founds a new one.
    pub fn build_clusters(&self, items: &[Item]) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = Vec::new();

        for item in items {
            let tokens = tokenize(&item.title);
            match clusters
                .iter_mut()
                .find(|cluster| jaccard(&tokens, &cluster.tokens) >= self.threshold)
            {
                Some(cluster) => {
                    debug!("Item {} joins topic {}", item.id, cluster.id);
                    cluster.absorb(item, tokens);
                }
                None => clusters.push(Cluster::found(item, tokens)),
            }
        }

        clusters
    }

    /// Scores clusters and keeps the best `top_k`, highest score first.
    pub fn rank(&self, clusters: Vec<Cluster>, now: DateTime<Utc>) -> Vec<Topic> {
        let mut scored: Vec<(f64, Cluster)> = clusters
            .into_iter()
            .map(|cluster| (cluster.score(now), cluster))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.top_k);

        scored
            .into_iter()
            .map(|(score, cluster)| cluster.into_topic(score))
            .collect()
    }

    pub fn cluster(&self, items: &[Item], now: DateTime<Utc>) -> Vec<Topic> {
        let clusters = self.build_clusters(items);
        let total = clusters.len();
        let topics = self.rank(clusters, now);

        info!("Clustered {} items into {} topics, kept {}", items.len(), total, topics.len());
        topics
    }
}
