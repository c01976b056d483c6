use std::sync::Arc;

use anyhow::Result;

use dailybrief_core::digest::DigestSynthesizer;
use dailybrief_core::feed::FeedCollector;
use dailybrief_core::publish::BlogPublisher;
use dailybrief_core::{AppConfig, Clock, SystemClock};

/// One full pipeline run: collect → synthesize → publish, strictly in
/// that order. Publishing never starts before synthesis returns.
pub async fn run(config: AppConfig) -> Result<()> {
    tracing::info!("Starting daily digest run with {} sources", config.feeds.len());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let collector = FeedCollector::new(&config.fetch, Arc::clone(&clock))?;
    let synthesizer = DigestSynthesizer::new(config.ai.clone(), Arc::clone(&clock))?;
    let publisher = BlogPublisher::new(config.blog.clone(), Arc::clone(&clock))?;

    let articles = collector.collect(&config.feeds).await;
    if articles.is_empty() {
        // Terminal condition for this run; the next scheduled run retries
        tracing::error!("No articles collected from any source, stopping");
        return Ok(());
    }

    for article in &articles {
        tracing::debug!(
            "Selected '{}' ({}) score {:.2} image '{}' summary '{}'",
            article.title,
            article.source,
            article.importance_score,
            article.image_url,
            article.summary.chars().take(100).collect::<String>(),
        );
    }

    let digest = match synthesizer.synthesize(&articles).await {
        Ok(digest) => digest,
        Err(e) => {
            tracing::error!("Digest synthesis failed: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!(
        "Digest ready: '{}' ({} chars)",
        digest.title,
        digest.content.chars().count()
    );

    let outcome = publisher.publish(&digest).await;
    match outcome.url() {
        Some(url) => tracing::info!("Run complete, digest published at {}", url),
        None => tracing::error!("Run complete, but the digest was not published"),
    }

    Ok(())
}
