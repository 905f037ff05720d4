use serde::{Deserialize, Serialize};

/// Admin panel user record, as returned by the `/auth/users/` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub phone: String,
    pub role: String,
    #[serde(default)]
    pub last_visit_time: String,
}

/// Response shape of the paged user listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub total: i64,
}

/// Credentials for the login exchange.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

/// Payload for account registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub phone: String,
    pub password: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_users_list_response() {
        let json = r#"{"users":[{"user_id":7,"phone":"+15550100","role":"admin","last_visit_time":"2024-05-01T10:00:00Z"}],"total":1}"#;

        let parsed: UsersListResponse = serde_json::from_str(json).expect("users list");
        assert_eq!(parsed.total, 1);
        assert_eq!(parsed.users.len(), 1);
        assert_eq!(parsed.users[0].user_id, 7);
        assert_eq!(parsed.users[0].role, "admin");
    }

    #[test]
    fn register_request_omits_absent_email() {
        let request = RegisterRequest {
            phone: "+15550100".into(),
            password: "secret".into(),
            code: "1234".into(),
            email: None,
        };
        let encoded = serde_json::to_string(&request).expect("encode");
        assert!(!encoded.contains("email"));
    }
}
