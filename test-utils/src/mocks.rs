//! Mock implementations for testing.
//!
//! Token sources that count their calls, and an interceptor that records
//! what the client sent.

use async_trait::async_trait;
use jobad_client::{ApiError, ApiResult, RawResponse, Token, TokenSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Always returns the same token.
#[derive(Debug)]
pub struct StaticTokenSource {
    access_token: String,
    calls: AtomicUsize,
}

impl StaticTokenSource {
    /// Create a source handing out `access_token`.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self) -> ApiResult<Token> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Token::new(self.access_token.clone(), 3600))
    }
}

/// Hands out `token-1`, `token-2`, ... so tests can tell refreshes apart.
#[derive(Debug, Default)]
pub struct SequenceTokenSource {
    calls: AtomicUsize,
}

impl SequenceTokenSource {
    /// Create a source starting at `token-1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for SequenceTokenSource {
    async fn fetch_token(&self) -> ApiResult<Token> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Token::new(format!("token-{n}"), 3600))
    }
}

/// Sleeps before each fetch, to hold a fetch in flight.
#[derive(Debug)]
pub struct SlowTokenSource {
    delay: Duration,
    inner: SequenceTokenSource,
}

impl SlowTokenSource {
    /// Create a source that waits `delay` per fetch.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: SequenceTokenSource::new(),
        }
    }

    /// Number of fetches started so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

#[async_trait]
impl TokenSource for SlowTokenSource {
    async fn fetch_token(&self) -> ApiResult<Token> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_token().await
    }
}

/// Fails every fetch.
#[derive(Debug)]
pub struct FailingTokenSource {
    message: String,
    calls: AtomicUsize,
}

impl FailingTokenSource {
    /// Create a source failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for FailingTokenSource {
    async fn fetch_token(&self) -> ApiResult<Token> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::credential(self.message.clone()))
    }
}

/// A request as seen by [`RecordingInterceptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Full URI
    pub uri: String,
    /// `Authorization` header, if any
    pub authorization: Option<String>,
    /// `Accept` header, if any
    pub accept: Option<String>,
}

/// Records every request and response status passing through the client.
#[derive(Debug, Default)]
pub struct RecordingInterceptor {
    requests: Mutex<Vec<RecordedRequest>>,
    statuses: Mutex<Vec<u16>>,
}

impl RecordingInterceptor {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Response statuses seen so far.
    #[must_use]
    pub fn statuses(&self) -> Vec<u16> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `Authorization` headers seen so far, in order.
    #[must_use]
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.requests()
            .into_iter()
            .map(|r| r.authorization)
            .collect()
    }
}

fn header(request: &reqwest::Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl jobad_client::Interceptor for RecordingInterceptor {
    fn on_request(&self, request: &mut reqwest::Request) {
        let recorded = RecordedRequest {
            method: request.method().to_string(),
            uri: request.url().to_string(),
            authorization: header(request, "authorization"),
            accept: header(request, "accept"),
        };
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded);
    }

    fn on_response(&self, response: &RawResponse) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(response.status.as_u16());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_token_source() {
        let source = SequenceTokenSource::new();
        assert_eq!(source.fetch_token().await.unwrap().secret(), "token-1");
        assert_eq!(source.fetch_token().await.unwrap().secret(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_token_source() {
        let source = FailingTokenSource::new("invalid_client");
        let err = source.fetch_token().await.unwrap_err();
        assert!(err.to_string().contains("invalid_client"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_slow_token_source() {
        let source = SlowTokenSource::new(Duration::from_millis(10));
        let token = source.fetch_token().await.unwrap();
        assert_eq!(token.secret(), "token-1");
    }
}
