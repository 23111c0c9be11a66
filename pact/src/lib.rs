//! Pact contract testing types.
//!
//! Provides types for consumer-driven contract testing with Pact, a fluent
//! builder, and a mock provider that serves a contract's interactions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod error;
pub mod mock;

pub use contract::{
    Contract, ContractBuilder, ContractMetadata, Interaction, PactSpecification, Participant,
    Request, Response,
};
pub use error::{PactError, PactResult};
pub use mock::{InteractionMatcher, MockProvider};
