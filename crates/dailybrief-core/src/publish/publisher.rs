use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use super::xmlrpc::{new_post_request, parse_new_post_response, NewPost, RpcResponse};
use crate::clock::Clock;
use crate::config::BlogConfig;
use crate::digest::Digest;
use crate::{Error, Result};

const PUBLISH_TIMEOUT_SECS: u64 = 60;

/// Result of one publish attempt.
///
/// `LikelyPublished` is the explicit form of "the response broke but a
/// post id came through": the remote side has probably committed the
/// post, and callers decide how to treat that instead of relying on
/// which exception fired first.
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    Published {
        post_id: String,
        url: String,
    },
    LikelyPublished {
        post_id: String,
        url: String,
        detail: String,
    },
    Failed {
        error: String,
    },
}

impl PublishOutcome {
    /// Both confirmed and likely publishes count as success
    pub fn is_success(&self) -> bool {
        !matches!(self, PublishOutcome::Failed { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            PublishOutcome::Published { url, .. } => Some(url),
            PublishOutcome::LikelyPublished { url, .. } => Some(url),
            PublishOutcome::Failed { .. } => None,
        }
    }
}

/// Posts a digest to the blog over metaWeblog XML-RPC.
pub struct BlogPublisher {
    client: Client,
    config: BlogConfig,
    clock: Arc<dyn Clock>,
}

impl BlogPublisher {
    pub fn new(config: BlogConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PUBLISH_TIMEOUT_SECS))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            config,
            clock,
        })
    }

    /// Publish the digest. Failures are folded into the outcome value;
    /// this never returns an error to the caller.
    pub async fn publish(&self, digest: &Digest) -> PublishOutcome {
        tracing::info!("Publishing digest: {}", digest.title);

        let post = NewPost {
            title: digest.title.clone(),
            description: digest.content.clone(),
            categories: vec![self.config.category.clone()],
            date_created: self.clock.now(),
        };
        let body = new_post_request(&self.config.username, &self.config.password, &post);

        let endpoint = format!(
            "{}/xmlrpc.php",
            self.config.api_endpoint.trim_end_matches('/')
        );

        let response = match self
            .client
            .post(&endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Publish request failed: {}", e);
                return PublishOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Publish endpoint returned HTTP {}", status);
            return PublishOutcome::Failed {
                error: format!("HTTP {} from {}", status, endpoint),
            };
        }

        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Cannot read publish response: {}", e);
                return PublishOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        match parse_new_post_response(&raw) {
            Ok(RpcResponse::Success { post_id }) => {
                let url = self.post_url(&post_id);
                tracing::info!("Digest published, post id {}, url {}", post_id, url);
                PublishOutcome::Published { post_id, url }
            }
            Ok(RpcResponse::Truncated { post_id, detail }) => {
                let url = self.post_url(&post_id);
                tracing::warn!(
                    "Post id {} received but response was malformed: {}",
                    post_id,
                    detail
                );
                PublishOutcome::LikelyPublished {
                    post_id,
                    url,
                    detail,
                }
            }
            Ok(RpcResponse::Fault { code, message }) => {
                tracing::error!("XML-RPC fault {}: {}", code, message);
                PublishOutcome::Failed { error: message }
            }
            Err(e) => {
                tracing::error!("Protocol error in publish response: {}", e);
                PublishOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn post_url(&self, post_id: &str) -> String {
        format!(
            "{}/archives/{}",
            self.config.api_endpoint.trim_end_matches('/'),
            post_id
        )
    }
}
