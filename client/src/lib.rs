//! Hypermedia client for the job advertisement posting API.
//!
//! This crate provides:
//! - Link catalog discovery from the API root document
//! - Bearer token caching with single-flight renewal
//! - A transport with a pluggable interceptor chain
//! - Hydration of HAL resources and lazy paging
//! - Classification of failures into typed errors
//! - One authorization retry per call on 401/403

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod advertisement;
pub mod catalog;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod link;
pub mod model;
pub mod resource;
pub mod token;
pub mod transport;

pub use advertisement::relations;
pub use catalog::LinkCatalog;
pub use classify::classify;
pub use client::{ApiClient, ApiClientBuilder, Target};
pub use config::{ClientConfig, CredentialConfig, MediaTypes};
pub use error::{ApiError, ApiErrorKind, ApiResult, ErrorPayload, FieldError, ResponseContext};
pub use link::{Link, Links};
pub use model::{
    Advertisement, AdvertisementState, AdvertisementSummary, Logo, PatchOperation,
    ProcessingStatus, Template,
};
pub use resource::{Page, Resource, ResponseMeta};
pub use token::{ClientCredentialsSource, Token, TokenProvider, TokenSource};
pub use transport::{ApiRequest, Interceptor, RawResponse, Transport};
