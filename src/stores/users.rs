//! User administration store - plain CRUD calls over the authenticated
//! client.

use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::models::{User, UsersListResponse};

/// Page size used by the admin user list.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// One page of the user listing.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Clone)]
pub struct UserStore {
    client: ApiClient,
}

impl UserStore {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Fetch one page of users. Pages are 1-based.
    pub async fn fetch_page(&self, page: u32, per_page: Option<u32>) -> Result<UserPage, ApiError> {
        let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = page.saturating_sub(1) * per_page;
        let response: UsersListResponse = self
            .client
            .get(&format!("/auth/users/?limit={per_page}&offset={offset}"))
            .await?;
        debug!(page, total = response.total, "Fetched user page");
        Ok(UserPage {
            users: response.users,
            total: response.total,
            page,
            per_page,
        })
    }

    /// Change a user's role.
    pub async fn change_role(&self, user_id: i64, role: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(
                "/auth/change_role",
                &serde_json::json!({ "user_id": user_id, "role": role }),
            )
            .await
    }

    /// Delete a user account.
    pub async fn delete(&self, user_id: i64) -> Result<(), ApiError> {
        self.client
            .post_empty("/auth/delete_user", &serde_json::json!({ "user_id": user_id }))
            .await
    }
}
