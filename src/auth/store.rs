//! Durable storage for session credentials.
//!
//! The store holds three named string entries: the access token, the refresh
//! token, and the cached user record (a JSON blob). It is pure key-value
//! storage: an absent entry is a valid state, and no parsing or auth logic
//! lives here.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Entry name for the short-lived bearer token.
pub const ACCESS_TOKEN_ENTRY: &str = "access_token";

/// Entry name for the longer-lived refresh token.
pub const REFRESH_TOKEN_ENTRY: &str = "refresh_token";

/// Entry name for the cached user record (JSON blob).
pub const USER_ENTRY: &str = "user";

/// Named string storage for session credentials.
pub trait CredentialStore: Send + Sync {
    /// Read an entry. Absence is a valid state, not an error.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Write an entry, replacing any previous value.
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Delete an entry. Deleting a missing entry is a no-op.
    fn remove(&self, name: &str) -> Result<()>;
}

/// File-backed credential store: one file per entry under a directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create credential directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let path = self.entry_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read credential entry: {}", name))?;
        Ok(Some(contents))
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let path = self.entry_path(name);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write credential entry: {}", name))?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.entry_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to delete credential entry: {}", name))?;
        }
        Ok(())
    }
}

/// In-memory credential store for tests and ephemeral sessions.
/// Clone shares the underlying map, so a test can keep a handle for
/// inspection after handing the store to the session.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    entries: std::sync::Arc<Mutex<HashMap<String, String>>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(name);
        Ok(())
    }
}
