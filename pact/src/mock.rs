//! Mock provider serving a contract's interactions over HTTP.
//!
//! Each interaction is mounted on a `wiremock` server. A request matches an
//! interaction when method and path are equal, every declared query pair
//! and header is present with the same value, and a declared JSON body is
//! equal. When several interactions match, the first declared wins.

use crate::contract::{Contract, Interaction, Request, Response};
use crate::error::{PactError, PactResult};
use tracing::debug;
use url::form_urlencoded;
use wiremock::{Match, Mock, MockServer, ResponseTemplate};

/// Matches incoming requests against one contract request.
#[derive(Debug, Clone)]
pub struct InteractionMatcher {
    method: String,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl InteractionMatcher {
    /// Matcher for `request`.
    #[must_use]
    pub fn new(request: &Request) -> Self {
        let query = request
            .query
            .as_deref()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self {
            method: request.method.to_ascii_uppercase(),
            path: request.path.clone(),
            query,
            headers: request
                .headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            body: request.body.clone(),
        }
    }
}

impl Match for InteractionMatcher {
    fn matches(&self, request: &wiremock::Request) -> bool {
        if request.method.as_str() != self.method || request.url.path() != self.path {
            return false;
        }

        let received: Vec<(String, String)> = request.url.query_pairs().into_owned().collect();
        if !self.query.iter().all(|pair| received.contains(pair)) {
            return false;
        }

        let headers_match = self.headers.iter().all(|(name, value)| {
            request
                .headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == value)
        });
        if !headers_match {
            return false;
        }

        match &self.body {
            Some(expected) => serde_json::from_slice::<serde_json::Value>(&request.body)
                .is_ok_and(|body| &body == expected),
            None => true,
        }
    }
}

fn response_template(response: &Response) -> ResponseTemplate {
    let mut template = ResponseTemplate::new(response.status);
    let mut content_type = None;
    for (name, value) in &response.headers {
        if name.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.as_str());
        } else {
            template = template.insert_header(name.as_str(), value.as_str());
        }
    }

    match (&response.body, content_type) {
        (Some(body), Some(mime)) => template.set_body_raw(body.to_string(), mime),
        (Some(body), None) => template.set_body_json(body),
        (None, Some(mime)) => template.insert_header("content-type", mime),
        (None, None) => template,
    }
}

/// A running provider stub for one contract.
pub struct MockProvider {
    server: MockServer,
    contract: Contract,
}

impl MockProvider {
    /// Start a server and mount every interaction of `contract`.
    pub async fn start(contract: Contract) -> Self {
        let server = MockServer::start().await;
        for interaction in &contract.interactions {
            mount(&server, interaction).await;
        }
        debug!(
            provider = %contract.provider.name,
            uri = %server.uri(),
            interactions = contract.interactions.len(),
            "Mock provider started"
        );
        Self { server, contract }
    }

    /// Base URI of the provider, e.g. `http://127.0.0.1:54321`.
    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The contract being served.
    #[must_use]
    pub const fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Requests received so far.
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Number of received requests matching the interaction `description`.
    pub async fn hits(&self, description: &str) -> usize {
        let Some(interaction) = self.contract.interaction(description) else {
            return 0;
        };
        let matcher = InteractionMatcher::new(&interaction.request);
        self.received_requests()
            .await
            .iter()
            .filter(|r| matcher.matches(r))
            .count()
    }

    /// Check that every interaction was exercised and nothing else was requested.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::UnexpectedRequest`] for the first request that
    /// matched no interaction, then [`PactError::MissingInteraction`] for
    /// the first interaction never exercised.
    pub async fn verify(&self) -> PactResult<()> {
        let received = self.received_requests().await;
        let matchers: Vec<(&Interaction, InteractionMatcher)> = self
            .contract
            .interactions
            .iter()
            .map(|i| (i, InteractionMatcher::new(&i.request)))
            .collect();

        if let Some(request) = received
            .iter()
            .find(|r| !matchers.iter().any(|(_, m)| m.matches(r)))
        {
            let path = request.url.query().map_or_else(
                || request.url.path().to_string(),
                |q| format!("{}?{q}", request.url.path()),
            );
            return Err(PactError::UnexpectedRequest {
                method: request.method.to_string(),
                path,
            });
        }

        for (interaction, matcher) in &matchers {
            if !received.iter().any(|r| matcher.matches(r)) {
                return Err(PactError::MissingInteraction(interaction.description.clone()));
            }
        }
        Ok(())
    }
}

async fn mount(server: &MockServer, interaction: &Interaction) {
    Mock::given(InteractionMatcher::new(&interaction.request))
        .respond_with(response_template(&interaction.response))
        .named(interaction.description.clone())
        .mount(server)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContractBuilder, Interaction};
    use serde_json::json;

    fn contract() -> Contract {
        ContractBuilder::new("ats-sync", "advertisement-api")
            .interaction(
                Interaction::new("a request for the root document").will_respond_with(
                    Response::status(200)
                        .header("Content-Type", "application/hal+json")
                        .json_body(json!({"_links": {"self": {"href": "/"}}})),
                ),
            )
            .interaction(
                Interaction::new("a request for advertisements of advertiser 345")
                    .with_request(
                        Request::get("/advertisement")
                            .query("advertiserId=345")
                            .header("Accept", "application/vnd.seek.advertisement-list+json; version=1, application/vnd.seek.advertisement-error+json; version=1"),
                    )
                    .will_respond_with(Response::status(200).json_body(json!({"_embedded": {"advertisements": []}}))),
            )
            .build()
    }

    #[tokio::test]
    async fn test_serves_interactions() {
        let provider = MockProvider::start(contract()).await;
        let http = reqwest::Client::new();

        let root = http.get(provider.uri()).send().await.unwrap();
        assert_eq!(root.status(), 200);
        assert_eq!(
            root.headers()["content-type"].to_str().unwrap(),
            "application/hal+json"
        );

        let list = http
            .get(format!("{}/advertisement?advertiserId=345", provider.uri()))
            .header("accept", "application/vnd.seek.advertisement-list+json; version=1, application/vnd.seek.advertisement-error+json; version=1")
            .send()
            .await
            .unwrap();
        assert_eq!(list.status(), 200);

        assert_eq!(provider.hits("a request for the root document").await, 1);
        provider.verify().await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_reports_missing_interaction() {
        let provider = MockProvider::start(contract()).await;
        reqwest::get(provider.uri()).await.unwrap();

        let err = provider.verify().await.unwrap_err();
        assert!(matches!(err, PactError::MissingInteraction(ref d) if d.contains("advertiser 345")));
    }

    #[tokio::test]
    async fn test_verify_reports_unexpected_request() {
        let provider = MockProvider::start(contract()).await;
        let response = reqwest::get(format!("{}/logo", provider.uri())).await.unwrap();
        assert_eq!(response.status(), 404);

        let err = provider.verify().await.unwrap_err();
        assert!(matches!(err, PactError::UnexpectedRequest { ref path, .. } if path == "/logo"));
    }

    #[tokio::test]
    async fn test_header_mismatch_is_not_served() {
        let provider = MockProvider::start(contract()).await;
        let response = reqwest::get(format!("{}/advertisement?advertiserId=345", provider.uri()))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
