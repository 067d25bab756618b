//! App state: config, cache-aside resolver, release service, OAuth.

use std::sync::Arc;

use tracing::warn;

use nime_cache::CacheAside;
use nime_core::constants::{
    DEFAULT_ANILIST_API_URL, DEFAULT_GITHUB_API_URL, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_JIKAN_API_URL, DEFAULT_KVS_API_URL, DEFAULT_MAX_RETRIES, DEFAULT_RELEASE_REPO,
    IMAGE_CDN_PREFIX,
};
use nime_core::error::Result;
use nime_core::traits::{KvStore, ReleaseIndex, UpstreamSource};
use nime_crypto::WebhookSecret;
use nime_kvs::{CacheClient, KvsConfig, MemoryStore, WireKvsStore};
use nime_releases::{ReleaseService, ReleaseSynchronizer};
use nime_upstream::{build_client, GitHubConfig, GitHubReleases, JikanClient, JikanConfig};

use crate::oauth::AniListOAuth;

/// Default HTTP port; the binary reads `PORT` itself.
pub const DEFAULT_PORT: u16 = 4000;

/// Service configuration, read once at startup.
#[derive(Clone)]
pub struct NimeConfig {
    /// KV service base URL (`KVS_API_URL`)
    pub kvs_api_url: String,
    /// KV credential (`AUTH_KEY`)
    pub kvs_auth_key: Option<String>,
    /// KV database id (`DB_KEY`)
    pub kvs_db_key: Option<String>,
    /// Anime metadata API base URL (`JIKAN_API_URL`)
    pub jikan_api_url: String,
    /// GitHub API base URL (`GITHUB_API_URL`)
    pub github_api_url: String,
    /// Optional GitHub token (`GITHUB_TOKEN`)
    pub github_token: Option<String>,
    /// Release repository as `owner/name` (`RELEASE_REPO`)
    pub release_repo: String,
    /// Webhook HMAC secret (`GITHUB_WEBHOOK_SECRET`)
    pub webhook_secret: Option<String>,
    /// AniList API base URL (`ANILIST_API_URL`)
    pub anilist_api_url: String,
    /// OAuth client id (`CLIENT_ID`)
    pub client_id: Option<String>,
    /// OAuth client secret (`CLIENT_SECRET`)
    pub client_secret: Option<String>,
    /// OAuth redirect URI (`REDIRECT_URI`)
    pub redirect_uri: Option<String>,
    /// Only URLs under this prefix are proxied by `/api/image`
    pub image_cdn_prefix: String,
    /// Upstream attempt budget (`UPSTREAM_MAX_RETRIES`)
    pub upstream_max_retries: u32,
}

impl Default for NimeConfig {
    fn default() -> Self {
        Self {
            kvs_api_url: DEFAULT_KVS_API_URL.into(),
            kvs_auth_key: None,
            kvs_db_key: None,
            jikan_api_url: DEFAULT_JIKAN_API_URL.into(),
            github_api_url: DEFAULT_GITHUB_API_URL.into(),
            github_token: None,
            release_repo: DEFAULT_RELEASE_REPO.into(),
            webhook_secret: None,
            anilist_api_url: DEFAULT_ANILIST_API_URL.into(),
            client_id: None,
            client_secret: None,
            redirect_uri: None,
            image_cdn_prefix: IMAGE_CDN_PREFIX.into(),
            upstream_max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl NimeConfig {
    /// Reads the environment (and `.env`, if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        Self {
            kvs_api_url: env_or("KVS_API_URL", defaults.kvs_api_url),
            kvs_auth_key: non_empty("AUTH_KEY"),
            kvs_db_key: non_empty("DB_KEY"),
            jikan_api_url: env_or("JIKAN_API_URL", defaults.jikan_api_url),
            github_api_url: env_or("GITHUB_API_URL", defaults.github_api_url),
            github_token: non_empty("GITHUB_TOKEN"),
            release_repo: env_or("RELEASE_REPO", defaults.release_repo),
            webhook_secret: non_empty("GITHUB_WEBHOOK_SECRET"),
            anilist_api_url: env_or("ANILIST_API_URL", defaults.anilist_api_url),
            client_id: non_empty("CLIENT_ID"),
            client_secret: non_empty("CLIENT_SECRET"),
            redirect_uri: non_empty("REDIRECT_URI"),
            image_cdn_prefix: defaults.image_cdn_prefix,
            upstream_max_retries: parsed("UPSTREAM_MAX_RETRIES")
                .unwrap_or(defaults.upstream_max_retries),
        }
    }

    /// Store config, when both store credentials are present.
    pub fn kvs(&self) -> Option<KvsConfig> {
        match (&self.kvs_db_key, &self.kvs_auth_key) {
            (Some(db), Some(auth)) => {
                Some(KvsConfig::new(db.clone(), auth.clone()).with_base_url(&self.kvs_api_url))
            }
            _ => None,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: String) -> String {
    non_empty(name).unwrap_or(default)
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    non_empty(name).and_then(|v| v.trim().parse().ok())
}

impl std::fmt::Debug for NimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("NimeConfig")
            .field("kvs_api_url", &self.kvs_api_url)
            .field("kvs_auth_key", &redact(&self.kvs_auth_key))
            .field("kvs_db_key", &self.kvs_db_key)
            .field("jikan_api_url", &self.jikan_api_url)
            .field("github_api_url", &self.github_api_url)
            .field("github_token", &redact(&self.github_token))
            .field("release_repo", &self.release_repo)
            .field("webhook_secret", &redact(&self.webhook_secret))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("redirect_uri", &self.redirect_uri)
            .field("upstream_max_retries", &self.upstream_max_retries)
            .finish()
    }
}

/// Shared handler state.
pub struct AppState {
    /// Configuration the state was built from
    pub config: NimeConfig,
    /// Cache-aside resolver for anime metadata
    pub anime: CacheAside,
    /// Release channels and manifest
    pub releases: ReleaseService,
    /// AniList OAuth, when fully configured
    pub oauth: Option<AniListOAuth>,
    /// Webhook secret; deliveries are rejected without one
    pub webhook_secret: Option<WebhookSecret>,
    /// Client for the image proxy
    pub http: reqwest::Client,
}

impl AppState {
    /// Wires the production clients from `config`.
    ///
    /// Without store credentials the cache lives in process memory.
    pub fn new(config: NimeConfig) -> Result<Self> {
        let store: Arc<dyn KvStore> = match config.kvs() {
            Some(kvs) => Arc::new(WireKvsStore::with_config(kvs)?),
            None => {
                warn!("AUTH_KEY/DB_KEY not set, caching in memory");
                Arc::new(MemoryStore::new())
            }
        };

        let jikan = JikanClient::with_config(JikanConfig {
            max_retries: config.upstream_max_retries,
            ..JikanConfig::new(&config.jikan_api_url)
        })?;

        let github = GitHubReleases::with_config(GitHubConfig {
            token: config.github_token.clone(),
            max_retries: config.upstream_max_retries,
            ..GitHubConfig::new(&config.release_repo).with_api_url(&config.github_api_url)
        })?;

        Self::with_components(config, store, Arc::new(jikan), Arc::new(github))
    }

    /// Wires the state around explicit store and upstream implementations.
    pub fn with_components(
        config: NimeConfig,
        store: Arc<dyn KvStore>,
        anime_source: Arc<dyn UpstreamSource>,
        release_index: Arc<dyn ReleaseIndex>,
    ) -> Result<Self> {
        let http = build_client(DEFAULT_HTTP_TIMEOUT_SECS)?;
        let cache = CacheClient::new(store);

        let anime = CacheAside::new(cache.clone(), anime_source);
        let releases = ReleaseService::new(release_index, ReleaseSynchronizer::new(cache));

        let oauth = AniListOAuth::from_config(&config, http.clone());
        if oauth.is_none() {
            warn!("CLIENT_ID/CLIENT_SECRET/REDIRECT_URI incomplete, OAuth routes disabled");
        }

        let webhook_secret = config.webhook_secret.as_deref().map(WebhookSecret::new);
        if webhook_secret.is_none() {
            warn!("GITHUB_WEBHOOK_SECRET not set, every webhook delivery will be rejected");
        }

        Ok(Self {
            config,
            anime,
            releases,
            oauth,
            webhook_secret,
            http,
        })
    }
}
