use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post-filter, enriched record derived from one feed entry.
///
/// Immutable after creation; the collector produces a fresh ranked list
/// each run instead of mutating articles in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Also the deduplication key within one collection run
    pub title: String,
    pub link: String,
    /// Display name of the feed this came from
    pub source: String,
    pub published: DateTime<Utc>,
    /// Entry summary with markup stripped
    pub summary: String,
    /// First qualifying image found in the entry's content fields,
    /// empty string when there is none
    pub image_url: String,
    /// Computed once at ingestion, never recomputed
    pub importance_score: f64,
}

/// One entry of a parsed feed, before recency filtering and enrichment
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// Full content body (feed-rs folds content:encoded in here)
    pub content: Option<String>,
    /// Raw summary/description HTML
    pub summary: Option<String>,
}
