//! GitHub releases client.
//!
//! Provides the release index the synchronizer reads from, and downloads of
//! JSON assets (the updater manifest) attached to releases.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use nime_core::constants::{
    DEFAULT_GITHUB_API_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_RELEASE_REPO,
};
use nime_core::error::{NimeError, Result};
use nime_core::traits::ReleaseIndex;
use nime_core::types::ReleaseRecord;

use crate::http::{build_client, send_json};
use crate::retry::RetryPolicy;

/// GitHub client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,
    /// Repository as `owner/name`
    pub repo: String,
    /// Optional token, raises the anonymous rate limit
    pub token: Option<String>,
    /// Attempt budget when rate limited
    pub max_retries: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.into(),
            repo: DEFAULT_RELEASE_REPO.into(),
            token: None,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl GitHubConfig {
    /// Creates a config for the given `owner/name` repository.
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            ..Default::default()
        }
    }

    /// Points the client at a different API host.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// [`ReleaseIndex`] backed by the GitHub releases API.
pub struct GitHubReleases {
    config: GitHubConfig,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl GitHubReleases {
    /// Creates a client with its own HTTP client.
    pub fn with_config(config: GitHubConfig) -> Result<Self> {
        let http_client = build_client(config.timeout_seconds)?;
        Self::with_client(config, http_client)
    }

    /// Creates a client sharing an existing HTTP client.
    ///
    /// Fails if the repository is not of the form `owner/name`.
    pub fn with_client(config: GitHubConfig, http_client: reqwest::Client) -> Result<Self> {
        let valid = config
            .repo
            .split_once('/')
            .map(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
            .unwrap_or(false);
        if !valid {
            return Err(NimeError::ConfigError(format!(
                "Release repository must be 'owner/name', got '{}'",
                config.repo
            )));
        }

        let retry = RetryPolicy::new(config.max_retries);
        Ok(Self {
            config,
            http_client,
            retry,
        })
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn releases_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| NimeError::ConfigError(format!("Invalid GitHub API URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| NimeError::ConfigError("GitHub API URL cannot be a base".into()))?;
            segments.pop_if_empty().push("repos");
            segments.extend(self.config.repo.split('/'));
            segments.push("releases");
        }
        url.query_pairs_mut().append_pair("per_page", "100");
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("Accept", "application/vnd.github+json");
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ReleaseIndex for GitHubReleases {
    #[instrument(skip(self))]
    async fn list_releases(&self) -> Result<Vec<ReleaseRecord>> {
        let url = self.releases_url()?;

        let releases: Vec<ReleaseRecord> = self
            .retry
            .run("releases", || {
                send_json(self.authorize(self.http_client.get(url.clone())), "releases")
            })
            .await?;

        debug!(count = releases.len(), "Fetched release index");
        Ok(releases)
    }

    #[instrument(skip(self))]
    async fn download_json(&self, url: &str) -> Result<Value> {
        let url = Url::parse(url)
            .map_err(|e| NimeError::ValidationError(format!("Invalid asset URL: {}", e)))?;

        self.retry
            .run(url.as_str(), || send_json(self.http_client.get(url.clone()), url.as_str()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GitHubReleases {
        GitHubReleases::with_config(GitHubConfig::new("Waradu/a.ni.me").with_api_url(server.uri()))
            .unwrap()
            .with_retry_policy(RetryPolicy::new(3).with_interval(Duration::from_millis(5)))
    }

    #[test]
    fn test_repo_validation() {
        assert!(GitHubReleases::with_config(GitHubConfig::new("no-slash")).is_err());
        assert!(GitHubReleases::with_config(GitHubConfig::new("a/b/c")).is_err());
        assert!(GitHubReleases::with_config(GitHubConfig::new("/b")).is_err());
        assert!(GitHubReleases::with_config(GitHubConfig::new("a/b")).is_ok());
    }

    #[test]
    fn test_releases_url() {
        let client = GitHubReleases::with_config(GitHubConfig::default()).unwrap();
        assert_eq!(
            client.releases_url().unwrap().as_str(),
            "https://api.github.com/repos/Waradu/a.ni.me/releases?per_page=100"
        );
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = GitHubConfig {
            token: Some("ghp_secret".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("ghp_secret"));
    }

    #[tokio::test]
    async fn test_list_releases() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/Waradu/a.ni.me/releases"))
            .and(query_param("per_page", "100"))
            .and(header("user-agent", "a.ni.me-api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "tag_name": "v2.0.0-beta.1", "published_at": "2024-06-01T00:00:00Z", "draft": false, "prerelease": true, "assets": [] },
                { "tag_name": "v1.9.0", "published_at": "2024-05-01T00:00:00Z", "draft": false, "prerelease": false, "assets": [] },
                { "tag_name": "v3.0.0", "published_at": null, "draft": true, "prerelease": false, "assets": [] }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let releases = client_for(&server).list_releases().await.unwrap();
        assert_eq!(releases.len(), 3);
        assert!(releases[0].prerelease);
        assert!(releases[2].draft);
    }

    #[tokio::test]
    async fn test_list_releases_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let err = client_for(&server).list_releases().await.unwrap_err();
        assert!(matches!(err, NimeError::MaxRetriesExceeded { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_download_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/v1.9.0/latest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "1.9.0" })))
            .mount(&server)
            .await;

        let url = format!("{}/download/v1.9.0/latest.json", server.uri());
        let manifest = client_for(&server).download_json(&url).await.unwrap();
        assert_eq!(manifest["version"], "1.9.0");

        assert!(client_for(&server).download_json("not a url").await.is_err());
    }
}
