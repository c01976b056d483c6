use std::sync::LazyLock;

use regex::Regex;

static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<img[^>]+>").expect("valid img tag regex"));

static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="([^"]+)""#).expect("valid src regex"));

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid markup regex"));

/// Schemes and placeholders that disqualify an image candidate
const REJECTED_PREFIXES: &[&str] = &["data:", "javascript:", "图片URL"];

/// Find the first qualifying `<img>` src in a block of HTML.
///
/// Tags are scanned in document order. A candidate qualifies when it is
/// non-empty, not a data/javascript URI or placeholder, and (when the
/// source declares an `image_host`) contains that substring. Candidates
/// failing the host filter are skipped, not fatal: a later tag may match.
pub fn extract_image_url(html: &str, image_host: Option<&str>) -> Option<String> {
    for tag in IMG_TAG.find_iter(html) {
        let Some(caps) = IMG_SRC.captures(tag.as_str()) else {
            continue;
        };
        let url = &caps[1];

        if url.is_empty() || REJECTED_PREFIXES.iter().any(|p| url.starts_with(p)) {
            continue;
        }

        if let Some(host) = image_host {
            if !url.contains(host) {
                continue;
            }
        }

        return Some(url.to_string());
    }

    None
}

/// Strip all markup tags, leaving plain text.
pub fn strip_tags(html: &str) -> String {
    MARKUP.replace_all(html, "").into_owned()
}
