//! NFT catalog store - plain CRUD calls over the authenticated client.

use tracing::debug;

use crate::api::{ApiClient, ApiError, FormField};
use crate::models::{NewNft, NftInfo, NftListResponse};

/// Cap for the full catalog listing.
/// The backend pages by an explicit limit; 50k covers the whole collection.
const DEFAULT_FETCH_LIMIT: u32 = 50_000;

#[derive(Clone)]
pub struct NftStore {
    client: ApiClient,
}

impl NftStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the full NFT catalog.
    pub async fn fetch_all(&self, limit: Option<u32>) -> Result<Vec<NftInfo>, ApiError> {
        let limit = limit.unwrap_or(DEFAULT_FETCH_LIMIT);
        let response: NftListResponse = self.client.get(&format!("/api/nft/all/{limit}")).await?;
        debug!(count = response.infos.len(), "Fetched NFT catalog");
        Ok(response.infos)
    }

    /// Fetch a single NFT by token id.
    pub async fn fetch_by_id(&self, id: i64) -> Result<NftInfo, ApiError> {
        self.client.get(&format!("/api/nft/{id}")).await
    }

    /// Create an NFT record, uploading the image as multipart form data.
    pub async fn create(&self, nft: NewNft) -> Result<(), ApiError> {
        let fields = vec![
            FormField::Text {
                name: "id".into(),
                value: nft.id.to_string(),
            },
            FormField::Text {
                name: "description".into(),
                value: nft.description,
            },
            FormField::File {
                name: "file".into(),
                file_name: nft.file_name,
                bytes: nft.bytes,
            },
        ];
        self.client.post_multipart("/api/nft_data", fields).await
    }
}
