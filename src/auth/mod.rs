//! Authentication module: session lifecycle, credential storage, and the
//! single-flight refresh coordinator.
//!
//! - `SessionState`: the authoritative session with its status machine
//! - `RefreshCoordinator`: at most one refresh exchange in flight
//! - `CredentialStore`: durable named-string storage for tokens and the
//!   cached user record

pub mod error;
pub mod refresh;
pub mod session;
pub mod store;

pub use error::AuthError;
pub use refresh::RefreshCoordinator;
pub use session::{SessionState, SessionStatus};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
