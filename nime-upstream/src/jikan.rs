//! Jikan (MyAnimeList) metadata client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use nime_core::constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_JIKAN_API_URL, DEFAULT_MAX_RETRIES};
use nime_core::error::{NimeError, Result};
use nime_core::traits::UpstreamSource;

use crate::http::{build_client, send_json};
use crate::retry::RetryPolicy;

/// Jikan client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JikanConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Attempt budget when rate limited
    pub max_retries: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_JIKAN_API_URL.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl JikanConfig {
    /// Creates a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Anime metadata source backed by the Jikan REST API.
pub struct JikanClient {
    config: JikanConfig,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl JikanClient {
    /// Creates a client with its own HTTP client.
    pub fn with_config(config: JikanConfig) -> Result<Self> {
        let http_client = build_client(config.timeout_seconds)?;
        Ok(Self::with_client(config, http_client))
    }

    /// Creates a client sharing an existing HTTP client.
    pub fn with_client(config: JikanConfig, http_client: reqwest::Client) -> Self {
        let retry = RetryPolicy::new(config.max_retries);
        Self {
            config,
            http_client,
            retry,
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn anime_url(&self, anime_id: &str) -> Result<Url> {
        let anime_id = anime_id.trim();
        if anime_id.is_empty() {
            return Err(NimeError::ValidationError("Anime ID not provided".into()));
        }
        if anime_id == "." || anime_id == ".." {
            return Err(NimeError::ValidationError(format!("Invalid anime ID '{}'", anime_id)));
        }

        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| NimeError::ConfigError(format!("Invalid Jikan base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| NimeError::ConfigError("Jikan base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["anime", anime_id]);
        Ok(url)
    }
}

#[async_trait]
impl UpstreamSource for JikanClient {
    #[instrument(skip(self))]
    async fn fetch(&self, resource_id: &str) -> Result<Value> {
        let url = self.anime_url(resource_id)?;

        let data: Value = self
            .retry
            .run(resource_id, || {
                send_json(self.http_client.get(url.clone()), resource_id)
            })
            .await?;

        debug!(resource_id, "Fetched anime data from upstream");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, max_retries: u32) -> JikanClient {
        let config = JikanConfig {
            max_retries,
            ..JikanConfig::new(server.uri())
        };
        JikanClient::with_config(config)
            .unwrap()
            .with_retry_policy(RetryPolicy::new(max_retries).with_interval(Duration::from_millis(5)))
    }

    #[test]
    fn test_anime_url() {
        let client = JikanClient::with_config(JikanConfig::default()).unwrap();
        assert_eq!(
            client.anime_url(" 52991 ").unwrap().as_str(),
            "https://api.jikan.moe/v4/anime/52991"
        );
        assert!(matches!(client.anime_url(""), Err(NimeError::ValidationError(_))));
    }

    #[test]
    fn test_anime_url_rejects_dot_segments() {
        let client = JikanClient::with_config(JikanConfig::default()).unwrap();
        for id in [".", "..", " .. "] {
            assert!(matches!(client.anime_url(id), Err(NimeError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/anime/52991"))
            .and(header("user-agent", "a.ni.me-api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "mal_id": 52991 } })))
            .expect(1)
            .mount(&server)
            .await;

        let data = client_for(&server, 10).fetch("52991").await.unwrap();
        assert_eq!(data["data"]["mal_id"], 52991);
    }

    #[tokio::test]
    async fn test_fetch_retries_through_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/anime/1"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/anime/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "mal_id": 1 } })))
            .expect(1)
            .mount(&server)
            .await;

        let data = client_for(&server, 10).fetch("1").await.unwrap();
        assert_eq!(data["data"]["mal_id"], 1);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server, 3).fetch("1").await.unwrap_err();
        assert!(matches!(err, NimeError::MaxRetriesExceeded { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_server_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 10).fetch("1").await.unwrap_err();
        assert!(matches!(err, NimeError::UpstreamStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_not_found_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, 10).fetch("999999").await.unwrap_err();
        assert!(matches!(err, NimeError::UpstreamNotFound(_)));
    }
}
