//! Domain data stores - plain CRUD callers over the session-wrapped
//! transport.
//!
//! Stores carry no auth logic of their own. An `ApiError` carrying
//! `SessionExpired` is terminal here: the session is already logged out and
//! retrying cannot succeed until the user logs in again.

pub mod nfts;
pub mod users;

pub use nfts::NftStore;
pub use users::{UserPage, UserStore};
