//! HTTP client configuration and building.
//!
//! Every crate that talks to the advertisement API shares one pooled
//! `reqwest::Client` built from an [`HttpConfig`].

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Product token sent in the `User-Agent` header unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("jobad-client-rust/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
///
/// The built client has no request timeout; the transport applies one per
/// request.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 10)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
    /// Refuse plain `http://` URLs
    pub https_only: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            https_only: false,
        }
    }
}

impl HttpConfig {
    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Append a product token to the default user agent, e.g. `my-app/2.1`.
    #[must_use]
    pub fn with_product(mut self, product: &str, version: &str) -> Self {
        self.user_agent = format!("{product}/{version} {DEFAULT_USER_AGENT}");
        self
    }

    /// Set pool settings.
    #[must_use]
    pub const fn with_pool_config(mut self, idle_timeout: Duration, max_idle: usize) -> Self {
        self.pool_idle_timeout = idle_timeout;
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Only allow `https://` requests.
    #[must_use]
    pub const fn with_https_only(mut self) -> Self {
        self.https_only = true;
        self
    }
}

/// Build the shared, pooled HTTP client.
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., TLS initialization fails).
///
/// # Examples
///
/// ```
/// use jobad_common::{HttpConfig, build_http_client};
///
/// let config = HttpConfig::default().with_product("ats-sync", "3.0.1");
/// let client = build_http_client(&config).expect("Failed to build client");
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .https_only(config.https_only)
        .use_rustls_tls()
        .build()
}
