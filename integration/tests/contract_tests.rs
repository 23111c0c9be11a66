//! Consumer contract tests for the advertisement API client.
//!
//! Each test serves a pact contract from a mock provider, drives the client
//! against it, then verifies every interaction was exercised and nothing
//! else was requested.

use futures::TryStreamExt;
use jobad_client::{
    AdvertisementState, ApiClient, ApiError, ApiErrorKind, ClientConfig, MediaTypes,
    ProcessingStatus, Target, TokenSource,
};
use jobad_common::{TracingConfig, init_tracing};
use jobad_pact::{Contract, ContractBuilder, Interaction, MockProvider, Request, Response};
use jobad_test_utils::fixtures::{
    ADVERTISEMENT_ID, ADVERTISER_ID, MISSING_ADVERTISEMENT_ID, REQUEST_ID, advertisement_page,
    advertisement_response, conflict_error, error_response, forbidden_legacy, not_found_error,
    root_interaction, validation_error,
};
use jobad_test_utils::{AdvertisementBuilder, RecordingInterceptor, SequenceTokenSource};
use serde_json::json;
use std::sync::Arc;

mod harness {
    use super::*;

    pub fn contract(interactions: Vec<Interaction>) -> Contract {
        interactions
            .into_iter()
            .fold(
                ContractBuilder::new("jobad-client", "advertisement-api").interaction(root_interaction()),
                ContractBuilder::interaction,
            )
            .build()
    }

    pub struct Harness {
        pub provider: MockProvider,
        pub client: ApiClient,
        pub tokens: Arc<SequenceTokenSource>,
        pub recorder: Arc<RecordingInterceptor>,
    }

    pub async fn start(interactions: Vec<Interaction>) -> Harness {
        init_tracing(&TracingConfig::default().with_log_level("debug"));

        let provider = MockProvider::start(contract(interactions)).await;
        let tokens = Arc::new(SequenceTokenSource::new());
        let recorder = Arc::new(RecordingInterceptor::new());
        let client = ApiClient::builder()
            .config(ClientConfig::new(provider.uri()))
            .token_source(Arc::clone(&tokens) as Arc<dyn TokenSource>)
            .interceptor(Arc::clone(&recorder) as Arc<dyn jobad_client::Interceptor>)
            .build()
            .unwrap();
        tracing::debug!(uri = %provider.uri(), "Harness started");

        Harness {
            provider,
            client,
            tokens,
            recorder,
        }
    }
}

fn advertisement_path(id: &str) -> String {
    format!("/advertisement/{id}")
}

fn create_request(body: serde_json::Value) -> Request {
    let media = MediaTypes::default();
    Request::post("/advertisement")
        .header("Accept", media.accept_advertisement())
        .header("Content-Type", media.advertisement)
        .json_body(body)
}

fn get_request(id: &str) -> Request {
    Request::get(advertisement_path(id)).header("Accept", MediaTypes::default().accept_advertisement())
}

fn advertisement_ok(status: u16, body: serde_json::Value) -> Response {
    Response::status(status)
        .header("Content-Type", MediaTypes::default().advertisement)
        .json_body(body)
}

#[tokio::test]
async fn test_create_advertisement() {
    let ad = AdvertisementBuilder::minimum_valid().build();
    let harness = harness::start(vec![
        Interaction::new("a request to create an advertisement")
            .with_request(create_request(serde_json::to_value(&ad).unwrap()))
            .will_respond_with(advertisement_ok(200, advertisement_response(ADVERTISEMENT_ID, &ad))),
    ])
    .await;

    let created = harness.client.create_advertisement(&ad).await.unwrap();

    assert!(created.self_uri().unwrap().as_str().ends_with(ADVERTISEMENT_ID));
    assert_eq!(created.properties.id.as_deref(), Some(ADVERTISEMENT_ID));
    assert_eq!(created.properties.state, Some(AdvertisementState::Open));
    assert_eq!(created.properties.job_title, ad.job_title);
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_create_advertisement_validation_failure() {
    let ad = AdvertisementBuilder::minimum_valid()
        .with_salary_minimum(-1)
        .build();
    let harness = harness::start(vec![
        Interaction::new("a request to create an advertisement with a negative salary")
            .with_request(create_request(serde_json::to_value(&ad).unwrap()))
            .will_respond_with(error_response(
                422,
                validation_error("salary.minimum", "ValueOutOfRange"),
            )),
    ])
    .await;

    let err = harness.client.create_advertisement(&ad).await.unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::Validation);
    assert_eq!(err.status(), Some(422));
    let errors = err.field_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field.as_deref(), Some("salary.minimum"));
    assert_eq!(errors[0].code, "ValueOutOfRange");
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_create_advertisement_conflict() {
    let ad = AdvertisementBuilder::minimum_valid().build();
    let existing = format!("https://adposting.cloud.seek.com.au/advertisement/{ADVERTISEMENT_ID}");
    let harness = harness::start(vec![
        Interaction::new("a request to create an advertisement with a reused creation id")
            .given("an advertisement with the creation id exists")
            .with_request(create_request(serde_json::to_value(&ad).unwrap()))
            .will_respond_with(error_response(409, conflict_error()).header("Location", existing.clone())),
    ])
    .await;

    let err = harness.client.create_advertisement(&ad).await.unwrap_err();

    match err {
        ApiError::Conflict { location, .. } => assert_eq!(location, Some(existing)),
        other => panic!("expected conflict, got {other:?}"),
    }
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_get_missing_advertisement() {
    let description = "a request for an advertisement that does not exist";
    let harness = harness::start(vec![
        Interaction::new(description)
            .with_request(get_request(MISSING_ADVERTISEMENT_ID))
            .will_respond_with(error_response(404, not_found_error())),
    ])
    .await;

    let err = harness
        .client
        .get_advertisement(Target::advertisement(MISSING_ADVERTISEMENT_ID))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::NotFound);
    assert_eq!(err.request_id(), Some(REQUEST_ID));
    assert_eq!(harness.provider.hits(description).await, 1);
    assert_eq!(harness.tokens.calls(), 1);
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let ad = AdvertisementBuilder::minimum_valid().build();
    let harness = harness::start(vec![
        Interaction::new("a request with an expired token")
            .with_request(get_request(ADVERTISEMENT_ID).header("Authorization", "Bearer token-1"))
            .will_respond_with(error_response(401, json!({"message": "Token expired"}))),
        Interaction::new("a request with a fresh token")
            .given("an advertisement exists")
            .with_request(get_request(ADVERTISEMENT_ID).header("Authorization", "Bearer token-2"))
            .will_respond_with(advertisement_ok(200, advertisement_response(ADVERTISEMENT_ID, &ad))),
    ])
    .await;

    let fetched = harness
        .client
        .get_advertisement(Target::advertisement(ADVERTISEMENT_ID))
        .await
        .unwrap();

    assert_eq!(fetched.properties.id.as_deref(), Some(ADVERTISEMENT_ID));
    assert_eq!(harness.tokens.calls(), 2);
    assert_eq!(harness.provider.hits("a request with an expired token").await, 1);
    assert_eq!(harness.provider.hits("a request with a fresh token").await, 1);
    assert_eq!(
        harness.recorder.authorizations(),
        vec![
            Some("Bearer token-1".to_string()),
            Some("Bearer token-1".to_string()),
            Some("Bearer token-2".to_string()),
        ]
    );
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_repeated_unauthorized_is_not_retried_again() {
    let description = "a request the advertiser may not make";
    let harness = harness::start(vec![
        Interaction::new(description)
            .with_request(get_request(ADVERTISEMENT_ID))
            .will_respond_with(error_response(401, json!({"message": "Access denied"}))),
    ])
    .await;

    let err = harness
        .client
        .get_advertisement(Target::advertisement(ADVERTISEMENT_ID))
        .await
        .unwrap_err();

    assert!(err.is_authorization_failure());
    assert_eq!(err.to_string(), "Access denied");
    assert_eq!(harness.provider.hits(description).await, 2);
    assert_eq!(harness.tokens.calls(), 2);
    assert_eq!(harness.recorder.statuses(), vec![200, 401, 401]);
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_legacy_forbidden_message() {
    let description = "a request for another advertiser's advertisement";
    let harness = harness::start(vec![
        Interaction::new(description)
            .given("the advertisement belongs to another advertiser")
            .with_request(get_request(ADVERTISEMENT_ID))
            .will_respond_with(error_response(
                403,
                forbidden_legacy("Forbidden: advertiser 345 is not permitted"),
            )),
    ])
    .await;

    let err = harness
        .client
        .get_advertisement(Target::advertisement(ADVERTISEMENT_ID))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ApiErrorKind::Unauthorized);
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.to_string(), "Forbidden: advertiser 345 is not permitted");
    assert_eq!(harness.provider.hits(description).await, 2);
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_list_advertisements_follows_next_links() {
    let media = MediaTypes::default();
    let next = format!("/advertisement?advertiserId={ADVERTISER_ID}&beforeId=2");
    let list_response = |body| {
        Response::status(200)
            .header("Content-Type", media.advertisement_list.clone())
            .json_body(body)
    };
    let harness = harness::start(vec![
        Interaction::new("a request for the second page of advertisements")
            .with_request(
                Request::get("/advertisement")
                    .query(format!("advertiserId={ADVERTISER_ID}&beforeId=2"))
                    .header("Accept", media.accept_advertisement_list()),
            )
            .will_respond_with(list_response(advertisement_page(&["1"], None))),
        Interaction::new("a request for the first page of advertisements")
            .given("the advertiser has three advertisements")
            .with_request(
                Request::get("/advertisement")
                    .query(format!("advertiserId={ADVERTISER_ID}"))
                    .header("Accept", media.accept_advertisement_list()),
            )
            .will_respond_with(list_response(advertisement_page(&["3", "2"], Some(&next)))),
    ])
    .await;

    let first = harness
        .client
        .list_advertisements(Some(ADVERTISER_ID))
        .await
        .unwrap();
    assert!(first.has_next());

    let pages: Vec<_> = harness.client.pages(first).try_collect().await.unwrap();
    let ids: Vec<&str> = pages
        .iter()
        .flat_map(|page| page.items.iter().map(|item| item.properties.id.as_str()))
        .collect();
    assert_eq!(ids, vec!["3", "2", "1"]);

    let last = pages.last().unwrap();
    assert!(!last.has_next());
    let before = harness.provider.received_requests().await.len();
    let err = harness.client.next_page(last).await.unwrap_err();
    assert_eq!(err.kind(), ApiErrorKind::NoMoreResults);
    assert_eq!(harness.provider.received_requests().await.len(), before);

    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_expire_advertisement() {
    let ad = AdvertisementBuilder::minimum_valid().build();
    let mut expired = advertisement_response(ADVERTISEMENT_ID, &ad);
    expired["state"] = json!("Expired");
    let media = MediaTypes::default();
    let harness = harness::start(vec![
        Interaction::new("a request to expire an advertisement")
            .given("an advertisement exists")
            .with_request(
                Request::patch(advertisement_path(ADVERTISEMENT_ID))
                    .header("Accept", media.accept_advertisement())
                    .header("Content-Type", media.advertisement_patch.clone())
                    .json_body(json!([{"op": "replace", "path": "state", "value": "Expired"}])),
            )
            .will_respond_with(advertisement_ok(202, expired)),
    ])
    .await;

    let updated = harness
        .client
        .expire_advertisement(Target::advertisement(ADVERTISEMENT_ID))
        .await
        .unwrap();

    assert_eq!(updated.properties.state, Some(AdvertisementState::Expired));
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_advertisement_processing_status() {
    let harness = harness::start(vec![
        Interaction::new("a request for the processing status of an advertisement")
            .given("an advertisement exists")
            .with_request(Request::head(advertisement_path(ADVERTISEMENT_ID)))
            .will_respond_with(
                Response::status(200)
                    .header("Processing-Status", "Completed")
                    .header("X-Request-Id", REQUEST_ID),
            ),
    ])
    .await;

    let status = harness
        .client
        .advertisement_status(Target::advertisement(ADVERTISEMENT_ID))
        .await
        .unwrap();

    assert_eq!(status, Some(ProcessingStatus::Completed));
    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_list_templates_and_logos() {
    let hal = MediaTypes::default().hal;
    let hal_response = |body| {
        Response::status(200)
            .header("Content-Type", hal.clone())
            .json_body(body)
    };
    let harness = harness::start(vec![
        Interaction::new("a request for the advertiser's templates")
            .with_request(
                Request::get("/template")
                    .query(format!("advertiserId={ADVERTISER_ID}"))
                    .header("Accept", hal.clone()),
            )
            .will_respond_with(hal_response(json!({
                "_embedded": {"templates": [
                    {"id": 1, "name": "Default", "state": "Active", "_links": {"self": {"href": "/template/1"}}}
                ]},
                "_links": {"self": {"href": "/template?advertiserId=345"}}
            }))),
        Interaction::new("a request for the advertiser's logos")
            .with_request(
                Request::get("/logo")
                    .query(format!("advertiserId={ADVERTISER_ID}"))
                    .header("Accept", hal.clone()),
            )
            .will_respond_with(hal_response(json!({
                "_embedded": {"logos": [
                    {"id": 7, "name": "Company logo"},
                    {"id": 8, "name": "Alternative logo"}
                ]}
            }))),
    ])
    .await;

    let templates = harness.client.list_templates(Some(ADVERTISER_ID)).await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates.items[0].properties.id, 1);
    assert_eq!(templates.items[0].properties.state.as_deref(), Some("Active"));
    assert!(templates.items[0].self_uri().unwrap().as_str().ends_with("/template/1"));

    let logos = harness.client.list_logos(Some(ADVERTISER_ID)).await.unwrap();
    let names: Vec<&str> = logos.items.iter().map(|l| l.properties.name.as_str()).collect();
    assert_eq!(names, vec!["Company logo", "Alternative logo"]);
    assert!(!logos.has_next());

    harness.provider.verify().await.unwrap();
}

#[tokio::test]
async fn test_contract_is_written_as_pact_file() {
    let contract = harness::contract(vec![
        Interaction::new("a request for an advertisement")
            .given("an advertisement exists")
            .with_request(get_request(ADVERTISEMENT_ID))
            .will_respond_with(advertisement_ok(
                200,
                advertisement_response(ADVERTISEMENT_ID, &AdvertisementBuilder::full().build()),
            )),
    ]);
    let dir = tempfile::tempdir().unwrap();

    let path = contract.write_to(dir.path()).unwrap();

    assert!(path.ends_with("jobad-client-advertisement-api.json"));
    let written: Contract = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(written, contract);
}
