//! OAuth2 access tokens for the FCM HTTP v1 API.
//!
//! A [`TokenSource`] mints tokens; the [`TokenProvider`] puts a cache in
//! front of it so one token serves every send until the cache entry lapses.
//! An entry never outlives the token it holds: its TTL is capped at the
//! token's `expires_in` less [`EXPIRY_MARGIN_SECS`].

use async_trait::async_trait;
use firepush_cache::{CacheStore, remember_for};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::config::TOKEN_LIFETIME_SECS;
use crate::{PushError, Result};

/// Scope granting access to the FCM send API.
pub const FIREBASE_MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Seconds before a token's expiry at which it stops being served from cache.
pub const EXPIRY_MARGIN_SECS: u64 = 60;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Service-account key as downloaded from the Firebase console.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PushError::Credential(e.to_string()))
    }

    /// Read and parse a key file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PushError::Credential(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }
}

/// A freshly minted bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// Mints access tokens from a credential file.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self, credential: &Path, scope: &str) -> Result<AccessToken>;
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    TOKEN_LIFETIME_SECS
}

/// Exchanges a signed JWT assertion for an access token.
#[derive(Debug, Clone)]
pub struct ServiceAccountTokenSource {
    client: Client,
}

impl ServiceAccountTokenSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sign the RS256 assertion presented to the token endpoint.
    pub fn assertion(key: &ServiceAccountKey, scope: &str, issued_at: u64) -> Result<String> {
        use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

        let claims = AssertionClaims {
            iss: &key.client_email,
            scope,
            aud: &key.token_uri,
            iat: issued_at,
            exp: issued_at + TOKEN_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &signing_key)?)
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn fetch_token(&self, credential: &Path, scope: &str) -> Result<AccessToken> {
        let key = ServiceAccountKey::from_file(credential).await?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| PushError::Auth {
                message: e.to_string(),
                status: None,
            })?
            .as_secs();
        let assertion = Self::assertion(&key, scope, now)?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Auth {
                message: format!("token endpoint returned {}: {}", status, body),
                status: Some(status.as_u16()),
            });
        }

        let token: TokenResponse = response.json().await?;
        info!(client_email = %key.client_email, expires_in = token.expires_in, "Minted FCM access token");

        Ok(AccessToken {
            access_token: token.access_token,
            expires_in: token.expires_in,
        })
    }
}

/// Cache-backed access token lookup.
#[derive(Clone)]
pub struct TokenProvider {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn TokenSource>,
}

impl TokenProvider {
    pub fn new(cache: Arc<dyn CacheStore>, source: Arc<dyn TokenSource>) -> Self {
        Self { cache, source }
    }

    /// Return the cached token for `project_id`, minting one from
    /// `credential` when the cache has none.
    ///
    /// A minted token is kept for `ttl` or until [`EXPIRY_MARGIN_SECS`]
    /// before it expires, whichever comes first.
    pub async fn access_token(
        &self,
        project_id: &str,
        credential: &Path,
        ttl: Duration,
    ) -> Result<String> {
        let key = cache_key(project_id);
        let key_ref = key.as_str();
        let source = &self.source;

        remember_for(self.cache.as_ref(), key_ref, || async move {
            debug!(project_id, cache_key = key_ref, "Access token cache miss");
            let token = source
                .fetch_token(credential, FIREBASE_MESSAGING_SCOPE)
                .await?;
            let ttl = ttl.min(usable_lifetime(token.expires_in));
            Ok::<_, PushError>((token.access_token, ttl))
        })
        .await
    }

    /// Drop the cached token for `project_id`.
    pub async fn forget(&self, project_id: &str) -> Result<()> {
        Ok(self.cache.delete(&cache_key(project_id)).await?)
    }
}

fn usable_lifetime(expires_in: u64) -> Duration {
    Duration::from_secs(expires_in.saturating_sub(EXPIRY_MARGIN_SECS))
}

/// Cache key of the token for `project_id`.
pub fn cache_key(project_id: &str) -> String {
    slug(&format!("fcm-http-v1-oauth-token-{}", project_id))
}

/// URL-style slug: lowercase alphanumerics joined by single dashes.
///
/// `_` and whitespace act as separators, `@` becomes `at`, any other
/// punctuation is dropped.
pub fn slug(input: &str) -> String {
    fn push_word(out: &mut String, word: &str, pending_dash: &mut bool) {
        if *pending_dash && !out.is_empty() {
            out.push('-');
        }
        *pending_dash = false;
        out.push_str(word);
    }

    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            let lower: String = ch.to_lowercase().collect();
            push_word(&mut out, &lower, &mut pending_dash);
        } else if ch == '@' {
            pending_dash = true;
            push_word(&mut out, "at", &mut pending_dash);
            pending_dash = true;
        } else if ch == '-' || ch == '_' || ch.is_whitespace() {
            pending_dash = true;
        }
    }

    out
}
