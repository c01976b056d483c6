use chrono::{DateTime, Utc};

/// Title keywords worth +1.0 each (case-insensitive substring match)
const IMPORTANT_KEYWORDS: &[&str] = &[
    "突破",
    "breakthrough",
    "发布",
    "release",
    "重要",
    "important",
    "最新",
    "重磅",
    "革命性",
    "revolutionary",
];

const MAX_LENGTH_BONUS: f64 = 2.0;
const MAX_RECENCY_BONUS: f64 = 2.0;
const WINDOW_HOURS: f64 = 24.0;

/// Heuristic importance of one article.
///
/// Sum of keyword hits in the title, a length bonus capped at 2.0 and a
/// recency bonus decaying linearly to 0 at the 24-hour mark. `summary`
/// is the plain-text summary; its char count feeds the length bonus.
pub fn importance_score(
    title: &str,
    summary: &str,
    published: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = 0.0;

    let title_lower = title.to_lowercase();
    for keyword in IMPORTANT_KEYWORDS {
        if title_lower.contains(&keyword.to_lowercase()) {
            score += 1.0;
        }
    }

    score += (summary.chars().count() as f64 / 1000.0).min(MAX_LENGTH_BONUS);

    let hours_ago = (now - published).num_seconds() as f64 / 3600.0;
    score += (MAX_RECENCY_BONUS * (WINDOW_HOURS - hours_ago) / WINDOW_HOURS).max(0.0);

    score
}
