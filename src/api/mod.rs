//! Session-wrapped transport for the NFT admin REST API.
//!
//! `ApiClient` transparently applies the bearer-token and 401-recovery
//! protocol; `ApiError` is the single failure shape its callers handle.

pub mod client;
pub mod error;

pub use client::{ApiClient, CancelHandle, FormField, RequestBody, RequestEnvelope};
pub use error::ApiError;
