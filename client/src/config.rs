//! Client configuration.

use jobad_common::HttpConfig;
use secrecy::SecretString;
use std::time::Duration;

/// Versioned media types understood by the advertisement API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTypes {
    /// Generic hypermedia documents such as the root catalog
    pub hal: String,
    /// Advertisement representations (create, update, get)
    pub advertisement: String,
    /// JSON patch documents against an advertisement
    pub advertisement_patch: String,
    /// Structured error bodies
    pub advertisement_error: String,
    /// Paged advertisement summaries
    pub advertisement_list: String,
}

impl Default for MediaTypes {
    fn default() -> Self {
        Self::for_vendor("seek", 1)
    }
}

impl MediaTypes {
    /// Media types for `vendor` at API `version`.
    #[must_use]
    pub fn for_vendor(vendor: &str, version: u32) -> Self {
        let vnd = |name: &str| format!("application/vnd.{vendor}.{name}+json; version={version}");
        Self {
            hal: "application/hal+json".to_string(),
            advertisement: vnd("advertisement"),
            advertisement_patch: vnd("advertisement-patch"),
            advertisement_error: vnd("advertisement-error"),
            advertisement_list: vnd("advertisement-list"),
        }
    }

    /// `Accept` value for advertisement calls: the representation plus its error shape.
    #[must_use]
    pub fn accept_advertisement(&self) -> String {
        format!("{}, {}", self.advertisement, self.advertisement_error)
    }

    /// `Accept` value for paged advertisement listings.
    #[must_use]
    pub fn accept_advertisement_list(&self) -> String {
        format!("{}, {}", self.advertisement_list, self.advertisement_error)
    }
}

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URI of the root resource holding the link catalog
    pub base_url: String,
    /// Per-request timeout applied by the transport
    pub timeout: Duration,
    /// Default `Accept` header for calls that do not set one
    pub accept: String,
    /// Versioned media types
    pub media_types: MediaTypes,
    /// Pooled HTTP client settings
    pub http: HttpConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let media_types = MediaTypes::default();
        let mut http = HttpConfig::default();
        if let Ok(agent) = std::env::var("JOBAD_USER_AGENT") {
            http = http.with_user_agent(agent);
        }
        Self {
            base_url: std::env::var("JOBAD_API_URL")
                .unwrap_or_else(|_| "https://adposting.cloud.seek.com.au".to_string()),
            timeout: Duration::from_secs(30),
            accept: media_types.hal.clone(),
            media_types,
            http,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http = self.http.with_user_agent(user_agent);
        self
    }

    /// Set the default `Accept` header.
    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    /// Replace the versioned media types.
    #[must_use]
    pub fn with_media_types(mut self, media_types: MediaTypes) -> Self {
        self.media_types = media_types;
        self
    }

    /// Replace the HTTP client settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}

/// OAuth2 client-credentials settings for the token endpoint.
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// Token endpoint URL
    pub token_url: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Requested scope
    pub scope: Option<String>,
    /// Treat a token as expired this long before the server says it is
    pub expiry_skew: Duration,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            token_url: std::env::var("JOBAD_TOKEN_URL")
                .unwrap_or_else(|_| "https://api.seek.com.au/auth/oauth2/token".to_string()),
            client_id: std::env::var("JOBAD_CLIENT_ID").unwrap_or_default(),
            client_secret: SecretString::from(
                std::env::var("JOBAD_CLIENT_SECRET").unwrap_or_default(),
            ),
            scope: None,
            expiry_skew: Duration::from_secs(30),
        }
    }
}

impl CredentialConfig {
    /// Create credential settings.
    #[must_use]
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            ..Default::default()
        }
    }

    /// Request a specific scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Set the expiry skew.
    #[must_use]
    pub const fn with_expiry_skew(mut self, skew: Duration) -> Self {
        self.expiry_skew = skew;
        self
    }
}
