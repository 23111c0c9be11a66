//! Test fixtures with sample data.
//!
//! Response bodies in the shapes the advertisement API returns, plus pact
//! interactions built from them.

use crate::builders::HalDocumentBuilder;
use jobad_client::{Advertisement, MediaTypes};
use jobad_pact::{Interaction, Request, Response};
use serde_json::{Value, json};

/// Advertiser owning the sample advertisements.
pub const ADVERTISER_ID: &str = "345";

/// Id of the sample advertisement.
pub const ADVERTISEMENT_ID: &str = "8e2fde50-bc5f-4a12-9cfb-812e50500184";

/// Id of an advertisement that does not exist.
pub const MISSING_ADVERTISEMENT_ID: &str = "9b650105-7434-473f-8293-4e23b7e0e064";

/// Request id echoed by the sample error responses.
pub const REQUEST_ID: &str = "PactRequestId";

/// Root document linking every relation the client follows.
#[must_use]
pub fn root_document() -> Value {
    HalDocumentBuilder::new()
        .link("self", "/")
        .templated_link("advertisements", "/advertisement{?advertiserId}")
        .templated_link("advertisement", "/advertisement/{advertisementId}")
        .templated_link("templates", "/template{?advertiserId}")
        .templated_link("logos", "/logo{?advertiserId}")
        .build()
}

/// An advertisement as returned by the server: `ad` plus id, state and links.
#[must_use]
pub fn advertisement_response(id: &str, ad: &Advertisement) -> Value {
    let properties = serde_json::to_value(ad).unwrap_or_else(|_| json!({}));
    HalDocumentBuilder::from_properties(properties)
        .property("id", json!(id))
        .property("state", json!("Open"))
        .link("self", format!("/advertisement/{id}"))
        .link("view", format!("/advertisement/{id}/view"))
        .build()
}

/// One page of advertisement summaries; `next` links the following page.
#[must_use]
pub fn advertisement_page(ids: &[&str], next: Option<&str>) -> Value {
    let items = ids
        .iter()
        .map(|id| {
            HalDocumentBuilder::new()
                .property("id", json!(id))
                .property("jobTitle", json!(format!("Job {id}")))
                .property("state", json!("Open"))
                .link("self", format!("/advertisement/{id}"))
                .build()
        })
        .collect();
    let builder = HalDocumentBuilder::new()
        .link("self", format!("/advertisement?advertiserId={ADVERTISER_ID}"))
        .embedded("advertisements", items);
    match next {
        Some(href) => builder.link("next", href),
        None => builder,
    }
    .build()
}

/// A validation failure naming `field` and `code`.
#[must_use]
pub fn validation_error(field: &str, code: &str) -> Value {
    json!({
        "message": "Validation Failure",
        "errors": [{ "field": field, "code": code }]
    })
}

/// A 403 body in the legacy capitalised shape.
#[must_use]
pub fn forbidden_legacy(message: &str) -> Value {
    json!({ "Message": message, "Errors": [] })
}

/// Body returned when a creation id is reused.
#[must_use]
pub fn conflict_error() -> Value {
    json!({
        "message": "Conflict",
        "errors": [{ "code": "AlreadyExists" }]
    })
}

/// Body returned for a missing resource.
#[must_use]
pub fn not_found_error() -> Value {
    json!({ "message": "Resource not found", "errors": [] })
}

/// Pact interaction serving [`root_document`].
#[must_use]
pub fn root_interaction() -> Interaction {
    let media = MediaTypes::default();
    Interaction::new("a request for the API root")
        .with_request(Request::get("/").header("Accept", media.hal.clone()))
        .will_respond_with(
            Response::status(200)
                .header("Content-Type", media.hal)
                .json_body(root_document()),
        )
}

/// A JSON error response with the error media type and a request id.
#[must_use]
pub fn error_response(status: u16, body: Value) -> Response {
    Response::status(status)
        .header("Content-Type", MediaTypes::default().advertisement_error)
        .header("X-Request-Id", REQUEST_ID)
        .json_body(body)
}
