//! Mapping of non-2xx responses onto [`ApiError`].

use crate::error::{ApiError, ErrorPayload, ResponseContext};
use crate::transport::RawResponse;
use reqwest::StatusCode;

/// Classify a failed response. Performs no I/O.
#[must_use]
pub fn classify(response: &RawResponse) -> ApiError {
    let context = ResponseContext {
        method: response.method.to_string(),
        uri: response.url.to_string(),
        status: response.status.as_u16(),
        request_id: response.request_id().map(str::to_string),
    };

    match response.status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            let payload = structured_payload(response);
            let message = payload
                .as_ref()
                .map(|p| p.message.clone())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("{context} is not authorized."));
            ApiError::Unauthorized {
                context,
                payload,
                message,
            }
        }
        StatusCode::NOT_FOUND => ApiError::NotFound {
            payload: structured_payload(response),
            context,
        },
        StatusCode::CONFLICT => ApiError::Conflict {
            location: response.location().map(str::to_string),
            payload: structured_payload(response).unwrap_or_default(),
            context,
        },
        StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
            payload: structured_payload(response).unwrap_or_default(),
            context,
        },
        _ => ApiError::Generic {
            body: response.text(),
            context,
        },
    }
}

/// Parse a structured error body when the content type says it is JSON.
fn structured_payload(response: &RawResponse) -> Option<ErrorPayload> {
    if !response.is_json() || response.body.is_empty() {
        return None;
    }
    let payload = ErrorPayload::from_slice_lenient(&response.body);
    if payload.is_none() {
        tracing::debug!(status = %response.status, uri = %response.url, "Error body is not a JSON object");
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiErrorKind, FieldError};
    use reqwest::Method;
    use reqwest::header::{HeaderMap, HeaderValue};
    use url::Url;

    fn response(method: Method, status: u16, headers: &[(&'static str, &str)], body: &str) -> RawResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        RawResponse {
            method,
            url: Url::parse("http://host/advertisement/1").unwrap(),
            status: StatusCode::from_u16(status).unwrap(),
            headers: map,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_unauthorized_without_body_synthesizes_message() {
        let err = classify(&response(Method::GET, 401, &[], ""));
        assert_eq!(err.to_string(), "[GET] http://host/advertisement/1 is not authorized.");
        assert!(err.is_authorization_failure());
    }

    #[test]
    fn test_forbidden_with_legacy_body() {
        let err = classify(&response(
            Method::PUT,
            403,
            &[("content-type", "application/json")],
            r#"{"Message":"Forbidden for advertiser 345"}"#,
        ));
        assert_eq!(err.to_string(), "Forbidden for advertiser 345");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_forbidden_with_null_errors_keeps_message() {
        let err = classify(&response(
            Method::POST,
            403,
            &[("content-type", "application/json")],
            r#"{"message":"Advertiser 345 is not permitted","errors":null}"#,
        ));
        assert_eq!(err.to_string(), "Advertiser 345 is not permitted");
    }

    #[test]
    fn test_validation_with_malformed_entry_keeps_the_rest() {
        let err = classify(&response(
            Method::POST,
            422,
            &[("content-type", "application/vnd.seek.advertisement-error+json; version=1")],
            r#"{"message":"Validation Failure","errors":[{"field":"salary.minimum","code":"ValueOutOfRange"},{"code":null}]}"#,
        ));
        assert_eq!(err.field_errors(), &[FieldError::new("salary.minimum", "ValueOutOfRange")]);
        assert!(err.to_string().contains("Validation Failure"));
    }

    #[test]
    fn test_forbidden_ignores_non_json_body() {
        let err = classify(&response(
            Method::PUT,
            403,
            &[("content-type", "text/html")],
            "<html>denied</html>",
        ));
        assert!(matches!(err, ApiError::Unauthorized { payload: None, .. }));
    }

    #[test]
    fn test_not_found_carries_request_id() {
        let err = classify(&response(Method::GET, 404, &[("x-request-id", "req-404")], ""));
        assert_eq!(err.kind(), ApiErrorKind::NotFound);
        assert_eq!(err.request_id(), Some("req-404"));
    }

    #[test]
    fn test_conflict_carries_location() {
        let err = classify(&response(
            Method::POST,
            409,
            &[
                ("location", "http://host/advertisement/X"),
                ("content-type", "application/vnd.seek.advertisement-error+json; version=1"),
            ],
            r#"{"message":"Conflict","errors":[{"code":"AlreadyExists"}]}"#,
        ));
        match err {
            ApiError::Conflict { location, payload, .. } => {
                assert_eq!(location.as_deref(), Some("http://host/advertisement/X"));
                assert_eq!(payload.errors[0].code, "AlreadyExists");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validation_keeps_field_errors_verbatim() {
        let err = classify(&response(
            Method::POST,
            422,
            &[("content-type", "application/vnd.seek.advertisement-error+json; version=1")],
            r#"{"message":"Validation Failure","errors":[{"field":"salary.minimum","code":"ValueOutOfRange"}]}"#,
        ));
        assert_eq!(err.kind(), ApiErrorKind::Validation);
        assert_eq!(err.field_errors(), &[FieldError::new("salary.minimum", "ValueOutOfRange")]);
    }

    #[test]
    fn test_other_status_is_generic() {
        let err = classify(&response(Method::GET, 503, &[], "maintenance"));
        match err {
            ApiError::Generic { context, body } => {
                assert_eq!(context.status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
