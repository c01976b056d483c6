use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinSet;

use super::extract::{extract_image_url, strip_tags};
use super::fetcher::{FeedFetcher, FetchFeed};
use super::models::{Article, FeedItem};
use super::parser::parse_feed;
use super::score::importance_score;
use crate::clock::Clock;
use crate::config::{FeedSource, FetchConfig};
use crate::Result;

/// Trailing window an entry must fall inside to survive
const WINDOW_HOURS: i64 = 24;
/// Upper bound on any single feed's contribution
const PER_SOURCE_CAP: usize = 10;
/// Size of the final ranked selection
const MAX_ARTICLES: usize = 15;

/// Fetches every configured source, filters and ranks the entries, and
/// returns the top selection for digest synthesis.
pub struct FeedCollector {
    fetcher: Arc<dyn FetchFeed>,
    clock: Arc<dyn Clock>,
}

impl FeedCollector {
    pub fn new(config: &FetchConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            fetcher: Arc::new(FeedFetcher::new(config)?),
            clock,
        })
    }

    /// Collector over a caller-supplied fetch implementation.
    pub fn with_fetcher(fetcher: Arc<dyn FetchFeed>, clock: Arc<dyn Clock>) -> Self {
        Self { fetcher, clock }
    }

    /// Collect the ranked article selection across all sources.
    ///
    /// Sources are fetched concurrently; a failing source is logged and
    /// contributes nothing. Results are reassembled in configuration
    /// order before deduplication, so the earlier-listed source wins a
    /// title collision.
    pub async fn collect(&self, sources: &[FeedSource]) -> Vec<Article> {
        let now = self.clock.now();

        let mut join_set: JoinSet<(usize, Vec<Article>)> = JoinSet::new();
        for (index, source) in sources.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            join_set.spawn(async move {
                let articles = match collect_source(fetcher.as_ref(), &source, now).await {
                    Ok(articles) => {
                        tracing::info!(
                            "Collected {} articles from '{}'",
                            articles.len(),
                            source.name
                        );
                        articles
                    }
                    Err(e) => {
                        tracing::error!("Failed to collect from '{}': {}", source.name, e);
                        Vec::new()
                    }
                };
                (index, articles)
            });
        }

        let mut per_source: Vec<Vec<Article>> = vec![Vec::new(); sources.len()];
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((index, articles)) => per_source[index] = articles,
                Err(e) => tracing::error!("Collection task panicked: {}", e),
            }
        }

        let merged: Vec<Article> = per_source.into_iter().flatten().collect();
        let total = merged.len();

        let selected = select_top(merged);
        tracing::info!(
            "Collected {} articles, selected top {} after dedup and ranking",
            total,
            selected.len()
        );

        selected
    }
}

async fn collect_source(
    fetcher: &dyn FetchFeed,
    source: &FeedSource,
    now: DateTime<Utc>,
) -> Result<Vec<Article>> {
    tracing::info!("Fetching feed '{}' from {}", source.name, source.url);

    let body = fetcher.fetch(&source.url).await?;
    let items = parse_feed(&body)?;

    Ok(build_articles(items, source, now))
}

/// Turn parsed feed items into scored articles.
///
/// Entries without a publish timestamp or outside the 24-hour window are
/// dropped; scanning stops once the per-source cap is reached.
fn build_articles(items: Vec<FeedItem>, source: &FeedSource, now: DateTime<Utc>) -> Vec<Article> {
    let cutoff = now - Duration::hours(WINDOW_HOURS);
    let mut articles = Vec::new();

    for item in items {
        let Some(published) = item.published else {
            tracing::debug!("Skipping '{}': no publish timestamp", item.title);
            continue;
        };
        if published < cutoff {
            continue;
        }

        // Full content body first, then the summary/description; the first
        // field yielding a qualifying image wins.
        let image_url = [item.content.as_deref(), item.summary.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|field| extract_image_url(field, source.image_host.as_deref()))
            .unwrap_or_default();

        let summary = item.summary.as_deref().map(strip_tags).unwrap_or_default();
        let importance_score = importance_score(&item.title, &summary, published, now);

        articles.push(Article {
            title: item.title,
            link: item.link,
            source: source.name.clone(),
            published,
            summary,
            image_url,
            importance_score,
        });

        if articles.len() >= PER_SOURCE_CAP {
            break;
        }
    }

    articles
}

/// Deduplicate by title, rank by importance, keep the top selection.
///
/// Dedup runs before the sort: a duplicate title keeps its first-seen
/// (source-order) occurrence even when a later one scored higher.
fn select_top(articles: Vec<Article>) -> Vec<Article> {
    let mut seen_titles = HashSet::new();
    let mut unique: Vec<Article> = articles
        .into_iter()
        .filter(|article| seen_titles.insert(article.title.clone()))
        .collect();

    // sort_by is stable, so equal scores keep their relative order
    unique.sort_by(|a, b| {
        b.importance_score
            .partial_cmp(&a.importance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    unique.truncate(MAX_ARTICLES);

    unique
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::clock::FixedClock;
    use crate::Error;

    fn now() -> DateTime<Utc> {
        "2025-06-02T12:00:00Z".parse().unwrap()
    }

    fn source(name: &str, image_host: Option<&str>) -> FeedSource {
        FeedSource {
            name: name.to_string(),
            url: format!("https://{}.example.com/rss", name),
            image_host: image_host.map(str::to_string),
        }
    }

    fn item(title: &str, hours_ago: i64) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: format!("https://example.com/{}", title),
            published: Some(now() - Duration::hours(hours_ago)),
            content: None,
            summary: None,
        }
    }

    fn article(title: &str, source: &str, score: f64) -> Article {
        Article {
            title: title.to_string(),
            link: "https://example.com/x".to_string(),
            source: source.to_string(),
            published: now(),
            summary: String::new(),
            image_url: String::new(),
            importance_score: score,
        }
    }

    #[test]
    fn drops_entries_older_than_window() {
        let items = vec![item("fresh", 1), item("stale", 25), item("edge", 23)];
        let articles = build_articles(items, &source("feed", None), now());

        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "edge"]);
    }

    #[test]
    fn drops_entries_without_timestamp() {
        let mut undated = item("undated", 1);
        undated.published = None;

        let articles = build_articles(vec![undated, item("dated", 1)], &source("feed", None), now());
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "dated");
    }

    #[test]
    fn caps_each_source_at_ten() {
        let items: Vec<_> = (0..30).map(|i| item(&format!("a{}", i), 1)).collect();
        let articles = build_articles(items, &source("feed", None), now());
        assert_eq!(articles.len(), 10);
        // Scanning stops at the cap, so the first ten entries survive
        assert_eq!(articles[0].title, "a0");
        assert_eq!(articles[9].title, "a9");
    }

    #[test]
    fn image_prefers_content_over_summary() {
        let mut with_both = item("pictured", 1);
        with_both.content = Some(r#"<img src="https://cdn.example.com/content.jpg">"#.to_string());
        with_both.summary = Some(r#"<img src="https://cdn.example.com/summary.jpg">"#.to_string());

        let articles = build_articles(vec![with_both], &source("feed", None), now());
        assert_eq!(articles[0].image_url, "https://cdn.example.com/content.jpg");
    }

    #[test]
    fn image_falls_back_to_summary_field() {
        let mut summary_only = item("pictured", 1);
        summary_only.summary =
            Some(r#"text <img src="https://cdn.example.com/summary.jpg">"#.to_string());

        let articles = build_articles(vec![summary_only], &source("feed", None), now());
        assert_eq!(articles[0].image_url, "https://cdn.example.com/summary.jpg");
    }

    #[test]
    fn image_url_is_empty_string_when_absent() {
        let mut plain = item("plain", 1);
        plain.summary = Some("<p>no pictures</p>".to_string());

        let articles = build_articles(vec![plain], &source("feed", None), now());
        assert_eq!(articles[0].image_url, "");
    }

    #[test]
    fn data_uri_image_is_rejected() {
        let mut tracked = item("tracked", 1);
        tracked.content = Some(r#"<img src="data:image/gif;base64,R0lGOD">"#.to_string());

        let articles = build_articles(vec![tracked], &source("feed", None), now());
        assert_eq!(articles[0].image_url, "");
    }

    #[test]
    fn source_image_host_filter_applies() {
        let mut entry = item("报道", 1);
        entry.content = Some(
            r#"<img src="https://other.cdn.com/y.jpg"><img src="https://image.jiqizhixin.com/x.jpg">"#
                .to_string(),
        );

        let articles = build_articles(
            vec![entry],
            &source("机器之心", Some("image.jiqizhixin.com")),
            now(),
        );
        assert_eq!(articles[0].image_url, "https://image.jiqizhixin.com/x.jpg");
    }

    #[test]
    fn summary_markup_is_stripped() {
        let mut entry = item("styled", 1);
        entry.summary = Some("<p>第一段 <b>要点</b></p>".to_string());

        let articles = build_articles(vec![entry], &source("feed", None), now());
        assert_eq!(articles[0].summary, "第一段 要点");
    }

    #[test]
    fn dedup_keeps_first_seen_regardless_of_score() {
        // Same title from two sources; the later one scores higher but
        // dedup runs before the sort and keeps the first occurrence.
        let articles = vec![
            article("模型发布", "机器之心", 1.0),
            article("模型发布", "量子位", 3.0),
        ];

        let selected = select_top(articles);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].source, "机器之心");
        assert!((selected[0].importance_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orders_by_descending_score() {
        let articles = vec![
            article("a", "s", 1.0),
            article("b", "s", 4.0),
            article("c", "s", 2.5),
        ];

        let selected = select_top(articles);
        let scores: Vec<_> = selected.iter().map(|a| a.importance_score).collect();
        assert_eq!(scores, vec![4.0, 2.5, 1.0]);
    }

    #[test]
    fn equal_scores_keep_prior_relative_order() {
        let articles = vec![
            article("first", "s", 2.0),
            article("second", "s", 2.0),
            article("third", "s", 2.0),
        ];

        let selected = select_top(articles);
        let titles: Vec<_> = selected.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    /// Canned responses keyed by URL, each with an artificial delay so
    /// tests can force sources to complete out of configuration order.
    struct StubFetcher {
        feeds: HashMap<String, (u64, Option<Vec<u8>>)>,
    }

    #[async_trait]
    impl FetchFeed for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            let (delay_ms, body) = self.feeds.get(url).expect("unknown url in stub").clone();
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            body.ok_or_else(|| Error::Fetch(format!("stub failure for {}", url)))
        }
    }

    fn rss_body(titles: &[&str]) -> Vec<u8> {
        let items: String = titles
            .iter()
            .map(|t| {
                format!(
                    "<item><title>{t}</title><link>https://example.com/{t}</link>\
                     <pubDate>Mon, 02 Jun 2025 09:00:00 GMT</pubDate></item>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>{items}</channel></rss>"#
        )
        .into_bytes()
    }

    #[tokio::test(start_paused = true)]
    async fn collect_merges_in_configuration_order_not_completion_order() {
        // The second source answers immediately, the first only after a
        // delay. A title both sources carry must still resolve to the
        // first-configured source.
        let sources = vec![source("slow", None), source("fast", None)];
        let mut feeds = HashMap::new();
        feeds.insert(
            sources[0].url.clone(),
            (50, Some(rss_body(&["共享标题", "仅慢源"]))),
        );
        feeds.insert(
            sources[1].url.clone(),
            (0, Some(rss_body(&["共享标题", "仅快源"]))),
        );

        let collector = FeedCollector::with_fetcher(
            Arc::new(StubFetcher { feeds }),
            Arc::new(FixedClock(now())),
        );
        let articles = collector.collect(&sources).await;

        assert_eq!(articles.len(), 3);
        let shared = articles.iter().find(|a| a.title == "共享标题").unwrap();
        assert_eq!(shared.source, "slow");
    }

    #[tokio::test(start_paused = true)]
    async fn failing_source_contributes_nothing() {
        let sources = vec![source("broken", None), source("healthy", None)];
        let mut feeds = HashMap::new();
        feeds.insert(sources[0].url.clone(), (0, None));
        feeds.insert(sources[1].url.clone(), (0, Some(rss_body(&["正常新闻"]))));

        let collector = FeedCollector::with_fetcher(
            Arc::new(StubFetcher { feeds }),
            Arc::new(FixedClock(now())),
        );
        let articles = collector.collect(&sources).await;

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "healthy");
    }

    #[test]
    fn truncates_to_fifteen() {
        let articles: Vec<_> = (0..40)
            .map(|i| article(&format!("t{}", i), "s", i as f64))
            .collect();

        let selected = select_top(articles);
        assert_eq!(selected.len(), 15);
        assert!((selected[0].importance_score - 39.0).abs() < 1e-9);
        assert!((selected[14].importance_score - 25.0).abs() < 1e-9);
    }
}
