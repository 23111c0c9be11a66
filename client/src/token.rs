//! Bearer token acquisition with single-flight refresh.
//!
//! [`TokenProvider`] caches one current token per client. Concurrent callers
//! that find no valid token share a single fetch from the [`TokenSource`];
//! the fetch runs on its own task so a caller giving up does not abort it
//! for the others.

use crate::config::CredentialConfig;
use crate::error::{ApiError, ApiResult};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// An access token issued by the credential endpoint.
#[derive(Debug, Clone)]
pub struct Token {
    /// Opaque bearer value
    pub access_token: SecretString,
    /// Lifetime in seconds; zero means the server gave none
    pub expires_in: u64,
    /// Granted scope
    pub scope: String,
    /// Token type, normally `Bearer`
    pub token_type: String,
    /// When the token was received
    pub obtained_at: DateTime<Utc>,
}

impl Token {
    /// Create a bearer token received now.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            expires_in,
            scope: String::new(),
            token_type: "Bearer".to_string(),
            obtained_at: Utc::now(),
        }
    }

    /// Bearer value for the `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Whether the token is expired, or will be within `skew`.
    ///
    /// Tokens without a lifetime never expire locally; the server's 401 is
    /// the only signal for those.
    #[must_use]
    pub fn is_expired(&self, skew: Duration) -> bool {
        if self.expires_in == 0 {
            return false;
        }
        let lifetime = Duration::from_secs(self.expires_in).saturating_sub(skew);
        chrono::Duration::from_std(lifetime)
            .ok()
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime))
            .is_some_and(|deadline| Utc::now() >= deadline)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    scope: String,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for Token {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: SecretString::from(response.access_token),
            expires_in: response.expires_in,
            scope: response.scope,
            token_type: response.token_type,
            obtained_at: Utc::now(),
        }
    }
}

/// Anything that can issue a fresh token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Request a new token.
    async fn fetch_token(&self) -> ApiResult<Token>;
}

/// OAuth2 client-credentials grant against a token endpoint.
pub struct ClientCredentialsSource {
    http: reqwest::Client,
    config: CredentialConfig,
}

impl ClientCredentialsSource {
    /// Create a source that posts to `config.token_url` using `http`.
    #[must_use]
    pub const fn new(http: reqwest::Client, config: CredentialConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsSource {
    #[instrument(skip(self), fields(client_id = %self.config.client_id))]
    async fn fetch_token(&self) -> ApiResult<Token> {
        let mut form = vec![("grant_type", "client_credentials")];
        if let Some(scope) = &self.config.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Token endpoint rejected credentials");
            let body = response.text().await;
            return Err(ApiError::credential(rejection_message(status, body)));
        }

        let body = response.bytes().await?;
        let token: TokenResponse =
            serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
                uri: self.config.token_url.clone(),
                source,
            })?;
        Ok(token.into())
    }
}

type InflightFetch = Shared<BoxFuture<'static, Result<Arc<Token>, String>>>;

/// Owns the current token and coordinates refreshes.
pub struct TokenProvider {
    source: Arc<dyn TokenSource>,
    current: Arc<ArcSwapOption<Token>>,
    inflight: Mutex<Option<InflightFetch>>,
    expiry_skew: Duration,
    fetches: Arc<AtomicU64>,
}

impl TokenProvider {
    /// Create a provider backed by `source`.
    #[must_use]
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            current: Arc::new(ArcSwapOption::empty()),
            inflight: Mutex::new(None),
            expiry_skew: Duration::from_secs(30),
            fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Treat tokens as expired this long before their stated lifetime ends.
    #[must_use]
    pub const fn with_expiry_skew(mut self, skew: Duration) -> Self {
        self.expiry_skew = skew;
        self
    }

    /// Seed the cache with a known token.
    #[must_use]
    pub fn with_token(self, token: Token) -> Self {
        self.current.store(Some(Arc::new(token)));
        self
    }

    /// The cached token, or a freshly fetched one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Credential`] when the fetch fails.
    pub async fn get_token(&self) -> ApiResult<Arc<Token>> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }
        self.refresh_single_flight().await
    }

    /// Drop the cached token so the next call fetches a new one.
    pub fn invalidate(&self) {
        debug!("Invalidating cached token");
        self.current.store(None);
    }

    /// Drop `stale` if it is still the current token.
    ///
    /// A token already replaced by a concurrent refresh is left alone, so
    /// several requests rejected with the same token cause one refresh.
    pub fn invalidate_token(&self, stale: &Arc<Token>) {
        self.current.rcu(|current: &Option<Arc<Token>>| match current {
            Some(token) if Arc::ptr_eq(token, stale) => None,
            other => other.clone(),
        });
    }

    /// Number of fetches issued to the token source.
    #[must_use]
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    fn cached(&self) -> Option<Arc<Token>> {
        self.current
            .load_full()
            .filter(|token| !token.is_expired(self.expiry_skew))
    }

    async fn refresh_single_flight(&self) -> ApiResult<Arc<Token>> {
        let fetch = {
            let mut inflight = self.inflight.lock().await;

            if let Some(token) = self.cached() {
                return Ok(token);
            }

            match inflight.as_ref() {
                Some(fetch) if fetch.peek().is_none() => fetch.clone(),
                _ => {
                    let fetch = self.spawn_fetch();
                    *inflight = Some(fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;

        let mut inflight = self.inflight.lock().await;
        if inflight.as_ref().is_some_and(|f| f.ptr_eq(&fetch)) {
            *inflight = None;
        }
        drop(inflight);

        result.map_err(ApiError::Credential)
    }

    fn spawn_fetch(&self) -> InflightFetch {
        let source = Arc::clone(&self.source);
        let current = Arc::clone(&self.current);
        let fetches = Arc::clone(&self.fetches);

        let task = tokio::spawn(async move {
            fetches.fetch_add(1, Ordering::Relaxed);
            info!("Requesting access token");
            let token = Arc::new(source.fetch_token().await.map_err(|e| e.to_string())?);
            current.store(Some(Arc::clone(&token)));
            debug!(expires_in = token.expires_in, "Access token cached");
            Ok(token)
        });

        let fetch: BoxFuture<'static, Result<Arc<Token>, String>> = Box::pin(async move {
            task.await
                .map_err(|e| format!("token fetch task failed: {e}"))?
        });
        fetch.shared()
    }
}

fn rejection_message(status: reqwest::StatusCode, body: reqwest::Result<String>) -> String {
    match body {
        Ok(body) => format!("token endpoint returned {status}: {body}"),
        Err(e) => {
            warn!(error = %e, "Failed to read token endpoint error body");
            format!("token endpoint returned {status} with an unreadable body: {e}")
        }
    }
}
