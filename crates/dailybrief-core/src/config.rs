use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    /// Feed sources, polled in the order they appear here.
    #[serde(default)]
    pub feeds: Vec<FeedSource>,
    pub ai: AiConfig,
    pub blog: BlogConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// A named RSS/Atom endpoint to poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    /// Display name, carried into every article from this feed
    pub name: String,
    pub url: String,
    /// When set, only `<img>` URLs containing this substring qualify
    /// as the article image for this source
    #[serde(default)]
    pub image_host: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Chat-completion endpoint URL
    pub api_endpoint: String,
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    /// Blog base URL; the XML-RPC endpoint lives at {api_endpoint}/xmlrpc.php
    pub api_endpoint: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_category")]
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_category() -> String {
    "AI日报".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Unlike tools that can fall back to defaults, the pipeline cannot run
    /// without feed sources and API credentials, so a missing or malformed
    /// file is an error.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[general]
log_level = "debug"

[[feeds]]
name = "机器之心"
url = "https://www.jiqizhixin.com/rss"
image_host = "image.jiqizhixin.com"

[[feeds]]
name = "量子位"
url = "https://www.qbitai.com/feed"

[ai]
api_endpoint = "https://api.example.com/v1/chat/completions"
api_key = "sk-test"
model = "gpt-4o-mini"

[blog]
api_endpoint = "https://blog.example.com"
username = "editor"
password = "secret"
"#;

    #[test]
    fn parses_full_config() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();

        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.feeds.len(), 2);
        assert_eq!(config.feeds[0].name, "机器之心");
        assert_eq!(
            config.feeds[0].image_host.as_deref(),
            Some("image.jiqizhixin.com")
        );
        assert!(config.feeds[1].image_host.is_none());
        assert_eq!(config.ai.model, "gpt-4o-mini");
    }

    #[test]
    fn fills_defaults() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();

        assert_eq!(config.ai.temperature, 0.7);
        assert_eq!(config.ai.max_tokens, 4000);
        assert_eq!(config.blog.category, "AI日报");
        assert_eq!(config.fetch.request_timeout_secs, 30);
    }

    #[test]
    fn rejects_missing_ai_section() {
        let result = toml::from_str::<AppConfig>("[general]\nlog_level = \"info\"\n");
        assert!(result.is_err());
    }
}
