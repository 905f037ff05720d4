//! Client configuration.
//!
//! The backend base URL and credential storage location come from the
//! environment (a `.env` file is honored if present), so deployments can
//! point the admin tooling at different backend instances without a rebuild.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Environment variable holding the backend base URL.
const ENV_BASE_URL: &str = "NFT_ADMIN_API_BASE_URL";

/// Environment variable overriding the credential storage directory.
const ENV_STORAGE_DIR: &str = "NFT_ADMIN_STORAGE_DIR";

/// Application name used for the default credential storage path.
const APP_NAME: &str = "nft-admin-client";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for the refresh exchange itself, in seconds.
/// A refresh that never resolves would leave every waiting request blocked,
/// so it gets a tighter bound than ordinary requests; expiry counts as a
/// refresh failure.
const REFRESH_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, e.g. `https://admin.example.com`.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub refresh_timeout_secs: u64,
    /// Override for the credential storage directory.
    pub storage_dir: Option<PathBuf>,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            refresh_timeout_secs: REFRESH_TIMEOUT_SECS,
            storage_dir: None,
        }
    }

    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let base_url = std::env::var(ENV_BASE_URL)
            .with_context(|| format!("{} is not set", ENV_BASE_URL))?;
        let mut config = Self::new(base_url);
        if let Ok(dir) = std::env::var(ENV_STORAGE_DIR) {
            config.storage_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }

    /// Directory for the file-backed credential store.
    pub fn credential_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_default_timeouts() {
        let config = Config::new("https://admin.example.com");
        assert_eq!(config.base_url, "https://admin.example.com");
        assert_eq!(config.request_timeout_secs, REQUEST_TIMEOUT_SECS);
        assert_eq!(config.refresh_timeout_secs, REFRESH_TIMEOUT_SECS);
        assert!(config.storage_dir.is_none());
    }

    #[test]
    fn explicit_storage_dir_wins() {
        let mut config = Config::new("https://admin.example.com");
        config.storage_dir = Some(PathBuf::from("/tmp/creds"));
        assert_eq!(config.credential_dir().unwrap(), PathBuf::from("/tmp/creds"));
    }
}
