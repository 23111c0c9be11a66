//! Single HTTP exchange with an interceptor chain.
//!
//! The transport sends one request and hands back the raw response. It
//! never retries and never interprets status codes; that is left to the
//! client and the classifier.

use crate::error::{ApiError, ApiResult};
use crate::token::Token;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

/// Correlation id header set by the API on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Asynchronous processing state header on advertisement responses.
pub const PROCESSING_STATUS_HEADER: &str = "processing-status";

/// A request to issue through the transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute target URI
    pub url: Url,
    /// `Accept` header; the transport default applies when unset
    pub accept: Option<String>,
    /// `Content-Type` of `body`
    pub content_type: Option<String>,
    /// Encoded body
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request without a body.
    #[must_use]
    pub const fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            accept: None,
            content_type: None,
            body: None,
        }
    }

    /// `GET url`
    #[must_use]
    pub const fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// `HEAD url`
    #[must_use]
    pub const fn head(url: Url) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Set the `Accept` header.
    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Encode `payload` as the JSON body with `content_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Serialization`] when the payload cannot be encoded.
    pub fn with_json<T: Serialize + ?Sized>(
        mut self,
        content_type: impl Into<String>,
        payload: &T,
    ) -> ApiResult<Self> {
        self.body = Some(serde_json::to_vec(payload)?);
        self.content_type = Some(content_type.into());
        Ok(self)
    }
}

/// A response as received, before classification or hydration.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Method of the request that produced it
    pub method: Method,
    /// URI of the request that produced it
    pub url: Url,
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Full body
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Value of header `name` when it is valid text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `X-Request-Id`
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header(REQUEST_ID_HEADER)
    }

    /// `Location`
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header(LOCATION.as_str())
    }

    /// `Content-Type`
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE.as_str())
    }

    /// `Processing-Status`
    #[must_use]
    pub fn processing_status(&self) -> Option<&str> {
        self.header(PROCESSING_STATUS_HEADER)
    }

    /// Whether the body is some flavour of JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }

    /// Body as lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Observes or amends traffic passing through the transport.
///
/// Request hooks run in registration order after the client's own auth and
/// header hooks, so they see the request exactly as it goes on the wire.
pub trait Interceptor: Send + Sync {
    /// Inspect or modify an outgoing request.
    fn on_request(&self, _request: &mut reqwest::Request) {}

    /// Inspect a received response.
    fn on_response(&self, _response: &RawResponse) {}
}

/// Sets `Authorization: Bearer <token>`.
pub struct BearerAuth {
    value: HeaderValue,
}

impl BearerAuth {
    /// Build the header for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Credential`] when the token is not a valid header value.
    pub fn new(token: &Token) -> ApiResult<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.secret()))
            .map_err(|_| ApiError::credential("access token is not a valid header value"))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

impl Interceptor for BearerAuth {
    fn on_request(&self, request: &mut reqwest::Request) {
        request.headers_mut().insert(AUTHORIZATION, self.value.clone());
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

/// Sends requests over a shared connection pool.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    timeout: Duration,
    default_accept: String,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Transport {
    /// Create a transport over `http` with a per-request `timeout`.
    #[must_use]
    pub fn new(http: reqwest::Client, timeout: Duration, default_accept: impl Into<String>) -> Self {
        Self {
            http,
            timeout,
            default_accept: default_accept.into(),
            interceptors: Vec::new(),
        }
    }

    /// Append a caller interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// The underlying pooled client.
    #[must_use]
    pub const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Issue `request` authorised with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Cancelled`] when `cancel` fires first,
    /// [`ApiError::Timeout`] when the per-request timeout elapses and
    /// [`ApiError::Transport`] for network-level failures. Non-2xx statuses
    /// are not errors at this layer.
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    pub async fn send(
        &self,
        request: &ApiRequest,
        token: &Token,
        cancel: &CancellationToken,
    ) -> ApiResult<RawResponse> {
        let auth = BearerAuth::new(token)?;
        let mut outgoing = self.build(request)?;

        auth.on_request(&mut outgoing);
        for interceptor in &self.interceptors {
            interceptor.on_request(&mut outgoing);
        }

        let timed_out = || ApiError::Timeout {
            method: request.method.to_string(),
            uri: request.url.to_string(),
            duration: self.timeout,
        };

        let exchange = async {
            let response = self.http.execute(outgoing).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?.to_vec();
            Ok::<_, reqwest::Error>(RawResponse {
                method: request.method.clone(),
                url: request.url.clone(),
                status,
                headers,
                body,
            })
        };

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Request cancelled");
                return Err(ApiError::Cancelled);
            }
            result = tokio::time::timeout(self.timeout, exchange) => match result {
                Ok(Ok(response)) => response,
                Ok(Err(e)) if e.is_timeout() => return Err(timed_out()),
                Ok(Err(e)) => return Err(ApiError::Transport(e)),
                Err(_) => return Err(timed_out()),
            },
        };

        for interceptor in &self.interceptors {
            interceptor.on_response(&response);
        }

        debug!(
            status = response.status.as_u16(),
            request_id = response.request_id().unwrap_or_default(),
            "Response received"
        );
        Ok(response)
    }

    fn build(&self, request: &ApiRequest) -> ApiResult<reqwest::Request> {
        let accept = request.accept.as_deref().unwrap_or(&self.default_accept);
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(ACCEPT, accept);

        if let Some(body) = &request.body {
            if let Some(content_type) = &request.content_type {
                builder = builder.header(CONTENT_TYPE, content_type);
            }
            builder = builder.body(body.clone());
        }

        Ok(builder.build()?)
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("timeout", &self.timeout)
            .field("default_accept", &self.default_accept)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}
