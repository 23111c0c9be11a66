//! Error types for the advertisement API client using thiserror 2.0.
//!
//! HTTP failures are classified into a closed set of variants that carry the
//! failing call's method, URI, status and request id so a caller can
//! reproduce it. Network-level failures stay distinct as
//! [`ApiError::Transport`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// One field-level problem reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `salary.minimum`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Machine-readable error code, e.g. `ValueOutOfRange`
    pub code: String,
    /// Human-readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldError {
    /// Create a field error for `field` with `code`.
    #[must_use]
    pub fn new(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            code: code.into(),
            message: None,
        }
    }
}

/// Structured error body returned by the API.
///
/// The canonical shape is `{ "message": ..., "errors": [...] }`. Older API
/// versions answer authorization failures with `{ "Message": ... }`; that
/// legacy shape is accepted and normalised into this one. A null `errors`
/// reads as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Summary message
    #[serde(default, alias = "Message")]
    pub message: String,
    /// Field-level errors, verbatim from the server
    #[serde(
        default,
        alias = "Errors",
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub errors: Vec<FieldError>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<FieldError>, D::Error> {
    Ok(Option::<Vec<FieldError>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ErrorPayload {
    /// Read an error body, keeping whatever parts of it are well formed.
    ///
    /// A body that does not match the canonical shape still yields its
    /// message and every field error that decodes on its own. Returns `None`
    /// only when the body is not a JSON object.
    #[must_use]
    pub fn from_slice_lenient(body: &[u8]) -> Option<Self> {
        if let Ok(payload) = serde_json::from_slice::<Self>(body) {
            return Some(payload);
        }
        let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
            return None;
        };
        let member = |name: &str, legacy: &str| map.get(name).or_else(|| map.get(legacy));

        let message = member("message", "Message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let errors = member("errors", "Errors")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| FieldError::deserialize(entry).ok())
                    .collect()
            })
            .unwrap_or_default();
        Some(Self { message, errors })
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for (i, error) in self.errors.iter().enumerate() {
            f.write_str(if i == 0 { " [" } else { ", " })?;
            if let Some(field) = &error.field {
                write!(f, "{field}: ")?;
            }
            f.write_str(&error.code)?;
        }
        if !self.errors.is_empty() {
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Identifies the call that produced a failing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseContext {
    /// HTTP method of the failing call
    pub method: String,
    /// Absolute URI of the failing call
    pub uri: String,
    /// HTTP status code
    pub status: u16,
    /// Value of the `X-Request-Id` response header
    pub request_id: Option<String>,
}

impl fmt::Display for ResponseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.method, self.uri)
    }
}

/// Payload-free discriminant of [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 401 or 403
    Unauthorized,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 422
    Validation,
    /// Any other non-2xx status
    Generic,
    /// Per-request timeout elapsed
    Timeout,
    /// Caller cancelled the operation
    Cancelled,
    /// Catalog or relation misuse
    Configuration,
    /// Credential endpoint failure
    Credential,
    /// Network-level failure below HTTP
    Transport,
    /// Body could not be encoded or decoded
    Serialization,
    /// No further page exists
    NoMoreResults,
}

/// Advertisement API client errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server rejected the credentials (401/403)
    #[error("{message}")]
    Unauthorized {
        /// Failing call
        context: ResponseContext,
        /// Structured body, when the server sent one
        payload: Option<ErrorPayload>,
        /// Server message or a synthesized one
        message: String,
    },

    /// The target resource does not exist (404)
    #[error("{context} was not found")]
    NotFound {
        /// Failing call
        context: ResponseContext,
        /// Structured body, when the server sent one
        payload: Option<ErrorPayload>,
    },

    /// The resource already exists (409)
    #[error("{context} conflicts with an existing resource{}", location_suffix(.location.as_deref()))]
    Conflict {
        /// Failing call
        context: ResponseContext,
        /// URI of the existing resource from the `Location` header
        location: Option<String>,
        /// Structured body
        payload: ErrorPayload,
    },

    /// The server rejected the payload (422)
    #[error("{context} failed validation: {payload}")]
    Validation {
        /// Failing call
        context: ResponseContext,
        /// Structured body with the field-level errors
        payload: ErrorPayload,
    },

    /// Any other non-2xx response
    #[error("{context} failed with status {}", .context.status)]
    Generic {
        /// Failing call
        context: ResponseContext,
        /// Raw response body
        body: String,
    },

    /// The per-request timeout elapsed
    #[error("[{method}] {uri} timed out after {duration:?}")]
    Timeout {
        /// HTTP method
        method: String,
        /// Target URI
        uri: String,
        /// Configured timeout
        duration: Duration,
    },

    /// The caller's cancellation signal fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Catalog or relation misuse; a programming error, never retried
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The link catalog or a resource has no such relation
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// A paged resource has no `next` link
    #[error("No more results")]
    NoMoreResults,

    /// The credential endpoint failed to issue a token
    #[error("Credential error: {0}")]
    Credential(String),

    /// Network-level failure (DNS, connection reset, TLS)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body did not match the expected shape
    #[error("Failed to decode response from {uri}: {source}")]
    Decode {
        /// URI the body came from
        uri: String,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// A request body could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A URI could not be parsed or joined
    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),
}

fn location_suffix(location: Option<&str>) -> String {
    location.map_or_else(String::new, |l| format!(" at {l}"))
}

/// Result type for advertisement API operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Payload-free discriminant.
    #[must_use]
    pub const fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Unauthorized { .. } => ApiErrorKind::Unauthorized,
            Self::NotFound { .. } => ApiErrorKind::NotFound,
            Self::Conflict { .. } => ApiErrorKind::Conflict,
            Self::Validation { .. } => ApiErrorKind::Validation,
            Self::Generic { .. } => ApiErrorKind::Generic,
            Self::Timeout { .. } => ApiErrorKind::Timeout,
            Self::Cancelled => ApiErrorKind::Cancelled,
            Self::Configuration(_) | Self::UnknownRelation(_) | Self::InvalidUri(_) => {
                ApiErrorKind::Configuration
            }
            Self::NoMoreResults => ApiErrorKind::NoMoreResults,
            Self::Credential(_) => ApiErrorKind::Credential,
            Self::Transport(_) => ApiErrorKind::Transport,
            Self::Decode { .. } | Self::Serialization(_) => ApiErrorKind::Serialization,
        }
    }

    /// Response context for errors produced from an HTTP response.
    #[must_use]
    pub const fn context(&self) -> Option<&ResponseContext> {
        match self {
            Self::Unauthorized { context, .. }
            | Self::NotFound { context, .. }
            | Self::Conflict { context, .. }
            | Self::Validation { context, .. }
            | Self::Generic { context, .. } => Some(context),
            _ => None,
        }
    }

    /// HTTP status of the failing response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.context().map(|c| c.status)
    }

    /// Correlation id of the failing response.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.context().and_then(|c| c.request_id.as_deref())
    }

    /// Field-level errors carried by validation and conflict failures.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation { payload, .. } | Self::Conflict { payload, .. } => &payload.errors,
            Self::Unauthorized { payload: Some(payload), .. }
            | Self::NotFound { payload: Some(payload), .. } => &payload.errors,
            _ => &[],
        }
    }

    /// Whether the server rejected the credentials.
    #[must_use]
    pub const fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a credential error.
    #[must_use]
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(status: u16) -> ResponseContext {
        ResponseContext {
            method: "POST".to_string(),
            uri: "http://host/advertisement".to_string(),
            status,
            request_id: Some("req-1".to_string()),
        }
    }

    #[test]
    fn test_legacy_forbidden_shape_is_normalised() {
        let payload: ErrorPayload =
            serde_json::from_str(r#"{"Message":"Forbidden for advertiser 345"}"#).unwrap();
        assert_eq!(payload.message, "Forbidden for advertiser 345");
        assert!(payload.errors.is_empty());
    }

    #[test]
    fn test_canonical_shape_keeps_field_errors() {
        let payload: ErrorPayload = serde_json::from_str(
            r#"{"message":"Validation Failure","errors":[{"field":"salary.minimum","code":"ValueOutOfRange"},{"code":"Unauthorised"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.errors.len(), 2);
        assert_eq!(payload.errors[0], FieldError::new("salary.minimum", "ValueOutOfRange"));
        assert_eq!(payload.errors[1].field, None);
    }

    #[test]
    fn test_null_errors_read_as_empty() {
        let payload: ErrorPayload =
            serde_json::from_str(r#"{"message":"Advertiser 345 is not permitted","errors":null}"#)
                .unwrap();
        assert_eq!(payload.message, "Advertiser 345 is not permitted");
        assert!(payload.errors.is_empty());
    }

    #[test]
    fn test_lenient_keeps_well_formed_entries() {
        let payload = ErrorPayload::from_slice_lenient(
            br#"{"message":"Validation Failure","errors":[{"field":"jobTitle","code":"Required"},{"field":42},"oops"]}"#,
        )
        .unwrap();
        assert_eq!(payload.message, "Validation Failure");
        assert_eq!(payload.errors, vec![FieldError::new("jobTitle", "Required")]);
    }

    #[test]
    fn test_lenient_rejects_non_objects() {
        assert!(ErrorPayload::from_slice_lenient(b"[1,2]").is_none());
        assert!(ErrorPayload::from_slice_lenient(b"not json").is_none());
        let payload = ErrorPayload::from_slice_lenient(br#"{"message":7,"errors":"bad"}"#).unwrap();
        assert_eq!(payload, ErrorPayload::default());
    }

    #[test]
    fn test_validation_display_lists_fields() {
        let err = ApiError::Validation {
            context: context(422),
            payload: ErrorPayload {
                message: "Validation Failure".to_string(),
                errors: vec![FieldError::new("salary.minimum", "ValueOutOfRange")],
            },
        };
        assert_eq!(
            err.to_string(),
            "[POST] http://host/advertisement failed validation: Validation Failure [salary.minimum: ValueOutOfRange]"
        );
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.request_id(), Some("req-1"));
    }

    #[test]
    fn test_conflict_display_includes_location() {
        let err = ApiError::Conflict {
            context: context(409),
            location: Some("http://host/advertisement/X".to_string()),
            payload: ErrorPayload::default(),
        };
        assert!(err.to_string().ends_with("at http://host/advertisement/X"));
        assert_eq!(err.kind(), ApiErrorKind::Conflict);
    }

    #[test]
    fn test_kinds_without_response() {
        assert_eq!(ApiError::Cancelled.kind(), ApiErrorKind::Cancelled);
        assert_eq!(ApiError::configuration("x").kind(), ApiErrorKind::Configuration);
        assert_eq!(ApiError::UnknownRelation("x".into()).kind(), ApiErrorKind::Configuration);
        assert!(ApiError::NoMoreResults.status().is_none());
        assert!(!ApiError::credential("denied").is_authorization_failure());
    }
}
