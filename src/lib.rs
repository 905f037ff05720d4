//! Client library for the NFT admin backend.
//!
//! The heart of the crate is the session protocol. Every request goes
//! through [`api::ApiClient`], which attaches the current bearer token and,
//! when the backend answers 401, refreshes the session before replaying the
//! original request exactly once. Refreshes are single-flight: however many
//! requests fail concurrently, one exchange runs and all of them share its
//! outcome. Irrecoverable failures log the session out exactly once and
//! surface uniformly as `SessionExpired`; consumers observe the terminal
//! state through [`auth::SessionState::subscribe`] and react (typically by
//! navigating to a login view).
//!
//! The domain stores ([`stores::NftStore`], [`stores::UserStore`]) are plain
//! CRUD callers on top of the client and carry no auth logic of their own.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod stores;

pub use api::{ApiClient, ApiError, CancelHandle, FormField, RequestBody, RequestEnvelope};
pub use auth::{
    AuthError, CredentialStore, FileCredentialStore, MemoryCredentialStore, RefreshCoordinator,
    SessionState, SessionStatus,
};
pub use config::Config;
pub use models::{LoginRequest, NewNft, NftInfo, RegisterRequest, User};
pub use stores::{NftStore, UserPage, UserStore};
