use chrono::{DateTime, Utc};
use feed_rs::parser;

use super::models::FeedItem;
use crate::{Error, Result};

/// Parse RSS/Atom content into feed items.
///
/// feed-rs hands back a structured publish timestamp, doing the RFC-2822
/// pubDate parsing itself; entries that carry no timestamp at all keep
/// `published: None` and are dropped downstream.
pub fn parse_feed(content: &[u8]) -> Result<Vec<FeedItem>> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content)?;
            let link = entry.links.first().map(|l| l.href.clone())?;

            let published = entry.published.map(DateTime::<Utc>::from);

            // content:encoded and <content> both land here
            let content = entry.content.and_then(|c| c.body);
            // RSS <description> lands here
            let summary = entry.summary.map(|s| s.content);

            Some(FeedItem {
                title,
                link,
                published,
                content,
                summary,
            })
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(items: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    {items}
  </channel>
</rss>"#
        )
        .into_bytes()
    }

    #[test]
    fn parses_basic_entry() {
        let content = rss(r#"
    <item>
      <title>模型发布</title>
      <link>https://example.com/a</link>
      <pubDate>Mon, 02 Jun 2025 09:00:00 GMT</pubDate>
      <description>&lt;p&gt;摘要&lt;/p&gt;</description>
    </item>"#);

        let items = parse_feed(&content).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "模型发布");
        assert_eq!(items[0].link, "https://example.com/a");
        assert_eq!(
            items[0].published.unwrap(),
            "2025-06-02T09:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(items[0].summary.as_deref(), Some("<p>摘要</p>"));
    }

    #[test]
    fn entry_without_pubdate_has_no_published() {
        let content = rss(r#"
    <item>
      <title>No date</title>
      <link>https://example.com/b</link>
      <description>text</description>
    </item>"#);

        let items = parse_feed(&content).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].published.is_none());
    }

    #[test]
    fn content_encoded_lands_in_content() {
        let content = rss(r#"
    <item>
      <title>With body</title>
      <link>https://example.com/c</link>
      <pubDate>Mon, 02 Jun 2025 09:00:00 GMT</pubDate>
      <description>short</description>
      <content:encoded>&lt;img src="https://image.jiqizhixin.com/x.jpg"&gt;</content:encoded>
    </item>"#);

        let items = parse_feed(&content).unwrap();
        assert!(items[0]
            .content
            .as_deref()
            .unwrap()
            .contains("image.jiqizhixin.com/x.jpg"));
    }

    #[test]
    fn rejects_non_feed_content() {
        assert!(parse_feed(b"<html><body>not a feed</body></html>").is_err());
    }
}
