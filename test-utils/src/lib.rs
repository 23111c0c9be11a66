//! Shared test utilities for advertisement API consumers.
//!
//! This crate provides:
//! - Payload builders with "with/without" field semantics
//! - Fixtures in the shapes the API returns
//! - Proptest generators for API types
//! - Mock token sources and a recording interceptor

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builders;
pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use builders::{AdvertisementBuilder, HalDocumentBuilder};
pub use generators::*;
pub use mocks::{
    FailingTokenSource, RecordedRequest, RecordingInterceptor, SequenceTokenSource,
    SlowTokenSource, StaticTokenSource,
};
