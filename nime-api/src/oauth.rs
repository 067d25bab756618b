//! AniList OAuth passthrough.
//!
//! The desktop app cannot hold the client secret, so the server runs the
//! authorization-code exchange and hands the token back through the app's
//! custom URL scheme.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use nime_core::constants::APP_CALLBACK_URL;

use crate::state::NimeConfig;

/// Why a code could not be turned into a token.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// AniList answered but without an access token.
    #[error("token response carried no access_token")]
    MissingToken,
    /// The exchange request failed or was refused.
    #[error("token exchange failed: {0}")]
    Exchange(String),
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// AniList OAuth client credentials and endpoints.
#[derive(Clone)]
pub struct AniListOAuth {
    api_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl AniListOAuth {
    /// Builds the client when id, secret and redirect are all configured.
    pub fn from_config(config: &NimeConfig, http: reqwest::Client) -> Option<Self> {
        Some(Self {
            api_url: config.anilist_api_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone()?,
            client_secret: config.client_secret.clone()?,
            redirect_uri: config.redirect_uri.clone()?,
            http,
        })
    }

    /// Where `/auth` sends the browser.
    pub fn authorize_url(&self) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &format!("{}/oauth/authorize", self.api_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
            ],
        )
    }

    /// Trades an authorization code for an access token.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let request = TokenRequest {
            grant_type: "authorization_code",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            redirect_uri: &self.redirect_uri,
            code,
        };

        let response = self
            .http
            .post(format!("{}/oauth/token", self.api_url))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OAuthError::Exchange(format!("HTTP {}", status.as_u16())));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        debug!("Token exchange succeeded");
        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or(OAuthError::MissingToken)
    }
}

/// The app URL that receives `token` in its fragment.
pub fn app_callback(token: &str) -> String {
    format!("{}#{}", APP_CALLBACK_URL, token)
}

impl std::fmt::Debug for AniListOAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AniListOAuth")
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_url: &str) -> NimeConfig {
        NimeConfig {
            anilist_api_url: api_url.into(),
            client_id: Some("1234".into()),
            client_secret: Some("shh".into()),
            redirect_uri: Some("https://nime.test/api/callback".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_all_credentials() {
        let partial = NimeConfig {
            client_id: Some("1234".into()),
            ..Default::default()
        };
        assert!(AniListOAuth::from_config(&partial, reqwest::Client::new()).is_none());
    }

    #[test]
    fn test_authorize_url() {
        let oauth =
            AniListOAuth::from_config(&config("https://anilist.co/api/v2"), reqwest::Client::new())
                .unwrap();
        assert_eq!(
            oauth.authorize_url().unwrap().as_str(),
            "https://anilist.co/api/v2/oauth/authorize?client_id=1234&redirect_uri=https%3A%2F%2Fnime.test%2Fapi%2Fcallback&response_type=code"
        );
    }

    #[test]
    fn test_app_callback() {
        assert_eq!(app_callback("tok"), "a.ni.me://callback#tok");
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_json(json!({
                "grant_type": "authorization_code",
                "client_id": "1234",
                "client_secret": "shh",
                "redirect_uri": "https://nime.test/api/callback",
                "code": "abc"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
            .expect(1)
            .mount(&server)
            .await;

        let oauth = AniListOAuth::from_config(&config(&server.uri()), reqwest::Client::new()).unwrap();
        assert_eq!(oauth.exchange_code("abc").await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_exchange_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token_type": "Bearer" })))
            .mount(&server)
            .await;

        let oauth = AniListOAuth::from_config(&config(&server.uri()), reqwest::Client::new()).unwrap();
        assert!(matches!(oauth.exchange_code("abc").await, Err(OAuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_exchange_refused() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
            .mount(&server)
            .await;

        let oauth = AniListOAuth::from_config(&config(&server.uri()), reqwest::Client::new()).unwrap();
        assert!(matches!(oauth.exchange_code("abc").await, Err(OAuthError::Exchange(_))));
    }
}
