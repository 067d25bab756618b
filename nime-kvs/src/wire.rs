//! HTTP key-value store client.
//!
//! The store keeps one string per key. We put a JSON document of the form
//! `{"value": <envelope>}` into that string, and the store itself wraps the
//! string in another `{"value": "..."}` object:
//!
//! ```text
//! POST /database/{db}/{key}?unsafe=true
//! {"value": "{\"value\":{\"data\":{...},\"expiry\":1718000000000,\"cached\":true}}"}
//! ```
//!
//! The double encoding is the shape existing deployments have written and
//! must be kept for reads of old entries to keep working.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use nime_core::constants::{DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_KVS_API_URL};
use nime_core::error::{NimeError, Result};
use nime_core::traits::KvStore;

/// Key-value store configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct KvsConfig {
    /// Store base URL
    pub base_url: String,
    /// Database identifier
    pub database: String,
    /// Value for the `Authorization` header
    pub auth_token: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl KvsConfig {
    /// Creates config for the default store host.
    pub fn new(database: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_KVS_API_URL.into(),
            database: database.into(),
            auth_token: auth_token.into(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    /// Points the client at a different store host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl std::fmt::Debug for KvsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvsConfig")
            .field("base_url", &self.base_url)
            .field("database", &self.database)
            .field("auth_token", &"[REDACTED]")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Outer object exchanged with the store.
#[derive(Debug, Serialize, Deserialize)]
struct StoreValue {
    #[serde(default)]
    value: Option<String>,
}

/// Inner object encoded into the stored string.
#[derive(Debug, Serialize, Deserialize)]
struct Wrapped {
    value: Value,
}

/// [`KvStore`] backed by the HTTP key-value service.
pub struct WireKvsStore {
    config: KvsConfig,
    http_client: reqwest::Client,
}

impl WireKvsStore {
    /// Creates a store client with its own HTTP client.
    pub fn with_config(config: KvsConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NimeError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(config, http_client))
    }

    /// Creates a store client sharing an existing HTTP client.
    pub fn with_client(config: KvsConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn key_url(&self, key: &str) -> Result<Url> {
        if key.is_empty() {
            return Err(NimeError::ValidationError("Cache key cannot be empty".into()));
        }
        // `PathSegmentsMut` drops dot segments instead of escaping them.
        if key == "." || key == ".." {
            return Err(NimeError::ValidationError(format!("Invalid cache key '{}'", key)));
        }

        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| NimeError::ConfigError(format!("Invalid KVS base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| NimeError::ConfigError("KVS base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["database", self.config.database.as_str(), key]);
        Ok(url)
    }
}

/// Encodes an envelope document into the store's double-wrapped body.
fn encode_value(value: &Value) -> Result<StoreValue> {
    let inner = serde_json::to_string(&Wrapped {
        value: value.clone(),
    })?;
    Ok(StoreValue { value: Some(inner) })
}

/// Decodes the store's body back into the envelope document.
fn decode_value(key: &str, body: StoreValue) -> Result<Option<Value>> {
    let Some(raw) = body.value else {
        return Ok(None);
    };

    let wrapped: Wrapped = serde_json::from_str(&raw).map_err(|e| NimeError::MalformedCacheValue {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Some(wrapped.value))
}

#[async_trait]
impl KvStore for WireKvsStore {
    #[instrument(skip(self))]
    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let url = self.key_url(key)?;
        debug!(key, "Retrieving from KVS");

        let response = self
            .http_client
            .get(url)
            .header("Authorization", &self.config.auth_token)
            .send()
            .await
            .map_err(|e| NimeError::CacheReadFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(key, "No data in KVS");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(NimeError::CacheReadFailed {
                key: key.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: StoreValue = response.json().await.map_err(|e| NimeError::MalformedCacheValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let value = decode_value(key, body)?;
        debug!(key, found = value.is_some(), "Retrieved from KVS");
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn write(&self, key: &str, value: &Value) -> Result<()> {
        let mut url = self.key_url(key)?;
        url.query_pairs_mut().append_pair("unsafe", "true");
        let body = encode_value(value)?;

        let response = self
            .http_client
            .post(url)
            .header("Authorization", &self.config.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| NimeError::CacheWriteFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(NimeError::CacheWriteFailed {
                key: key.to_string(),
                reason: format!("HTTP {}: {}", status, text),
            });
        }

        debug!(key, "Stored in KVS");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> WireKvsStore {
        let config = KvsConfig::new("db1", "secret-token").with_base_url(server.uri());
        WireKvsStore::with_config(config).unwrap()
    }

    #[test]
    fn test_value_is_double_encoded() {
        let doc = json!({ "data": { "mal_id": 1 }, "expiry": 10, "cached": true });
        let encoded = encode_value(&doc).unwrap();
        let inner: Value = serde_json::from_str(encoded.value.as_deref().unwrap()).unwrap();
        assert_eq!(inner, json!({ "value": doc }));

        let decoded = decode_value("1", encoded).unwrap();
        assert_eq!(decoded, Some(doc));
    }

    #[test]
    fn test_decode_rejects_unwrapped_string() {
        let body = StoreValue {
            value: Some("not json".into()),
        };
        assert!(matches!(
            decode_value("k", body),
            Err(NimeError::MalformedCacheValue { .. })
        ));
        assert_eq!(decode_value("k", StoreValue { value: None }).unwrap(), None);
    }

    #[test]
    fn test_key_url_escapes_segments() {
        let store = WireKvsStore::with_config(KvsConfig::new("db", "t")).unwrap();
        let url = store.key_url("a/b").unwrap();
        assert_eq!(url.as_str(), "https://kvs.wireway.ch/database/db/a%2Fb");
        assert!(store.key_url("").is_err());
    }

    #[test]
    fn test_key_url_rejects_dot_segments() {
        let store = WireKvsStore::with_config(KvsConfig::new("db", "t")).unwrap();
        for key in [".", ".."] {
            assert!(matches!(store.key_url(key), Err(NimeError::ValidationError(_))));
        }
        assert_eq!(
            store.key_url("...").unwrap().as_str(),
            "https://kvs.wireway.ch/database/db/..."
        );
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = KvsConfig::new("db", "super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[tokio::test]
    async fn test_read_sends_auth_and_unwraps() {
        let server = MockServer::start().await;
        let stored = json!({ "value": { "data": { "mal_id": 5 }, "expiry": 99, "cached": true } });
        Mock::given(method("GET"))
            .and(path("/database/db1/5"))
            .and(header("Authorization", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": stored.to_string() })))
            .expect(1)
            .mount(&server)
            .await;

        let value = store_for(&server).read("5").await.unwrap().unwrap();
        assert_eq!(value["data"]["mal_id"], 5);
        assert_eq!(value["expiry"], 99);
    }

    #[tokio::test]
    async fn test_read_not_found_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert_eq!(store_for(&server).read("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_server_error_is_err() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(matches!(
            store_for(&server).read("k").await,
            Err(NimeError::CacheReadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_posts_wrapped_value() {
        let server = MockServer::start().await;
        let doc = json!({ "tag_name": "v1", "expiry": 7, "cached": true });
        let expected = json!({ "value": json!({ "value": doc }).to_string() });
        Mock::given(method("POST"))
            .and(path("/database/db1/latest"))
            .and(query_param("unsafe", "true"))
            .and(header("Authorization", "secret-token"))
            .and(body_json(&expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).write("latest", &doc).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_failure_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let err = store_for(&server).write("k", &json!({})).await.unwrap_err();
        assert!(matches!(err, NimeError::CacheWriteFailed { .. }));
        assert!(err.to_string().contains("401"));
    }
}
