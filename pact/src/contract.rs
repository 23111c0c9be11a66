//! Pact contract types.

use crate::error::PactResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// A Pact contract between consumer and provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contract {
    /// Consumer participant
    pub consumer: Participant,
    /// Provider participant
    pub provider: Participant,
    /// Contract interactions
    pub interactions: Vec<Interaction>,
    /// Contract metadata
    pub metadata: ContractMetadata,
}

impl Contract {
    /// Pact file name, `<consumer>-<provider>.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.consumer.name, self.provider.name)
    }

    /// Interaction with `description`.
    #[must_use]
    pub fn interaction(&self, description: &str) -> Option<&Interaction> {
        self.interactions
            .iter()
            .find(|i| i.description == description)
    }

    /// Write the contract as pretty JSON into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> PactResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        info!(path = %path.display(), interactions = self.interactions.len(), "Pact file written");
        Ok(path)
    }
}

/// Fluent construction of a [`Contract`].
#[derive(Debug, Clone)]
pub struct ContractBuilder {
    consumer: String,
    provider: String,
    interactions: Vec<Interaction>,
}

impl ContractBuilder {
    /// Start a contract between `consumer` and `provider`.
    #[must_use]
    pub fn new(consumer: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            interactions: Vec::new(),
        }
    }

    /// Add an interaction.
    #[must_use]
    pub fn interaction(mut self, interaction: Interaction) -> Self {
        self.interactions.push(interaction);
        self
    }

    /// Finish the contract.
    #[must_use]
    pub fn build(self) -> Contract {
        Contract {
            consumer: Participant::new(self.consumer),
            provider: Participant::new(self.provider),
            interactions: self.interactions,
            metadata: ContractMetadata::default(),
        }
    }
}

/// A participant in a contract (consumer or provider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Participant name
    pub name: String,
}

impl Participant {
    /// Create a new participant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An interaction in a contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Interaction description
    pub description: String,
    /// Provider state (precondition)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_state: Option<String>,
    /// Expected request
    pub request: Request,
    /// Expected response
    pub response: Response,
}

impl Interaction {
    /// An interaction answering `GET /` with `200` until configured otherwise.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            provider_state: None,
            request: Request::get("/"),
            response: Response::status(200),
        }
    }

    /// Set the provider state.
    #[must_use]
    pub fn given(mut self, state: impl Into<String>) -> Self {
        self.provider_state = Some(state.into());
        self
    }

    /// Set the expected request.
    #[must_use]
    pub fn with_request(mut self, request: Request) -> Self {
        self.request = request;
        self
    }

    /// Set the response the provider returns.
    #[must_use]
    pub fn will_respond_with(mut self, response: Response) -> Self {
        self.response = response;
        self
    }
}

/// HTTP request in an interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Request {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Query string without the leading `?`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Request headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Request body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Request {
    /// A request with `method` to `path`.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: None,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// `GET path`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// `HEAD path`
    #[must_use]
    pub fn head(path: impl Into<String>) -> Self {
        Self::new("HEAD", path)
    }

    /// `POST path`
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// `PUT path`
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new("PUT", path)
    }

    /// `PATCH path`
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new("PATCH", path)
    }

    /// Set the query string.
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP response in an interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Response body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Response {
    /// A response with `status` and no body.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Contract metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContractMetadata {
    /// Pact specification version
    #[serde(rename = "pactSpecification")]
    pub pact_specification: PactSpecification,
}

/// Pact specification version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PactSpecification {
    /// Version string
    pub version: String,
}

impl Default for ContractMetadata {
    fn default() -> Self {
        Self {
            pact_specification: PactSpecification {
                version: "2.0.0".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract() -> Contract {
        ContractBuilder::new("ats-sync", "advertisement-api")
            .interaction(
                Interaction::new("a request to expire an advertisement")
                    .given("an open advertisement exists")
                    .with_request(
                        Request::patch("/advertisement/75b2b1fc")
                            .header("Content-Type", "application/vnd.seek.advertisement-patch+json; version=1")
                            .json_body(json!([{"op": "replace", "path": "state", "value": "Expired"}])),
                    )
                    .will_respond_with(Response::status(200).json_body(json!({"state": "Expired"}))),
            )
            .build()
    }

    #[test]
    fn test_pact_file_shape() {
        let value = serde_json::to_value(contract()).unwrap();
        assert_eq!(value["consumer"]["name"], "ats-sync");
        assert_eq!(value["interactions"][0]["providerState"], "an open advertisement exists");
        assert_eq!(value["interactions"][0]["request"]["method"], "PATCH");
        assert!(value["interactions"][0]["request"].get("query").is_none());
        assert_eq!(value["metadata"]["pactSpecification"]["version"], "2.0.0");
    }

    #[test]
    fn test_lookup_interaction() {
        let contract = contract();
        assert!(contract.interaction("a request to expire an advertisement").is_some());
        assert!(contract.interaction("missing").is_none());
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let contract = contract();
        let path = contract.write_to(dir.path().join("pacts")).unwrap();

        assert!(path.ends_with("ats-sync-advertisement-api.json"));
        let written: Contract = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written, contract);
    }
}
