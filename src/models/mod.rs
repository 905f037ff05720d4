//! Domain and wire types for the NFT admin API.
//!
//! Shapes mirror the backend DTOs; listing responses tolerate absent
//! collection fields.

pub mod nft;
pub mod user;

pub use nft::{NewNft, NftInfo, NftListResponse};
pub use user::{LoginRequest, RegisterRequest, User, UsersListResponse};
