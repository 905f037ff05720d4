use serde::{Deserialize, Serialize};

/// NFT metadata record from the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftInfo {
    pub token_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cid_v0: String,
    #[serde(default)]
    pub cid_v1: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub ipfs_image_link: String,
}

/// Response shape of the full catalog listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NftListResponse {
    #[serde(default)]
    pub infos: Vec<NftInfo>,
}

/// Payload for creating a new NFT record (uploaded as multipart form data).
#[derive(Debug, Clone)]
pub struct NewNft {
    pub id: i64,
    pub description: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}
