//! Session lifecycle management.
//!
//! `SessionState` is the authoritative in-memory view of the authentication
//! state: the token pair, the cached user, and an explicit status machine.
//! Exactly one instance exists per process, shared behind `Arc`, and it is
//! mutated only through the operations here - consumers never touch the
//! tokens directly.
//!
//! Auth endpoints (login, refresh, logout) go through a direct HTTP client
//! rather than the intercepting `ApiClient`, so a 401 from the refresh
//! exchange can never re-enter the retry protocol.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::error::AuthError;
use crate::auth::store::{
    CredentialStore, ACCESS_TOKEN_ENTRY, REFRESH_TOKEN_ENTRY, USER_ENTRY,
};
use crate::config::Config;
use crate::models::{LoginRequest, RegisterRequest, User};

/// Lifecycle states of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created, not yet rehydrated.
    Idle,
    /// A refresh exchange is in flight.
    Refreshing,
    /// Both tokens are present and believed valid.
    Authenticated,
    /// Terminal until the next successful login.
    Unauthenticated,
}

/// Token pair returned by the login and refresh exchanges.
#[derive(Debug, Deserialize)]
struct TokenPairResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Persisted envelope for the cached user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedUser {
    user: User,
    cached_at: DateTime<Utc>,
}

#[derive(Debug)]
struct SessionInner {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<User>,
    status: SessionStatus,
}

pub struct SessionState {
    inner: Mutex<SessionInner>,
    store: Box<dyn CredentialStore>,
    http: Client,
    base_url: String,
    refresh_timeout: Duration,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionState {
    /// Create the session and rehydrate it from the credential store.
    ///
    /// A complete persisted token pair yields an authenticated session.
    /// Unparseable or half-written persisted state must not fail startup:
    /// it is cleared and the session starts unauthenticated.
    pub fn init(config: &Config, store: Box<dyn CredentialStore>) -> Result<Arc<Self>> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build auth HTTP client")?;

        let access = store
            .get(ACCESS_TOKEN_ENTRY)
            .context("Failed to read persisted access token")?;
        let refresh = store
            .get(REFRESH_TOKEN_ENTRY)
            .context("Failed to read persisted refresh token")?;
        let raw_user = store
            .get(USER_ENTRY)
            .context("Failed to read persisted user record")?;

        let mut corrupted = false;
        let user = raw_user.and_then(|raw| match serde_json::from_str::<CachedUser>(&raw) {
            Ok(cached) => Some(cached.user),
            Err(e) => {
                warn!(error = %e, "Persisted user record is unparseable, resetting auth state");
                corrupted = true;
                None
            }
        });

        let complete = access.is_some() && refresh.is_some();
        let dangling = !complete && (access.is_some() || refresh.is_some());
        if dangling {
            warn!("Persisted token pair is incomplete, resetting auth state");
        }

        let usable = complete && !corrupted;
        let inner = if usable {
            SessionInner {
                access_token: access,
                refresh_token: refresh,
                user,
                status: SessionStatus::Authenticated,
            }
        } else {
            SessionInner {
                access_token: None,
                refresh_token: None,
                user: None,
                status: SessionStatus::Unauthenticated,
            }
        };
        let status = inner.status;
        let (status_tx, _) = watch::channel(status);

        let state = Arc::new(Self {
            inner: Mutex::new(inner),
            store,
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            refresh_timeout: Duration::from_secs(config.refresh_timeout_secs),
            status_tx,
        });

        if corrupted || dangling {
            state.clear_auth_state();
        } else if usable {
            debug!("Session rehydrated from credential store");
        }
        Ok(state)
    }

    /// Exchange credentials for a token pair.
    ///
    /// On success both tokens are set and persisted atomically from the
    /// caller's perspective; on any failure the session stays
    /// unauthenticated.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<(), AuthError> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(credentials)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            debug!(%status, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AuthError::NetworkFailure(format!(
                "login failed with status {status}"
            )));
        }

        let pair: TokenPairResponse = response
            .json()
            .await
            .map_err(|e| AuthError::NetworkFailure(format!("unexpected login response: {e}")))?;

        self.install_tokens(&pair);
        debug!("Login succeeded");
        Ok(())
    }

    /// Register a new account. Does not touch the token pair.
    pub async fn register(&self, data: &RegisterRequest) -> Result<(), AuthError> {
        let url = format!("{}/auth/registration", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(data)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_client_error() {
            Err(AuthError::InvalidCredentials)
        } else {
            Err(AuthError::NetworkFailure(format!(
                "registration failed with status {status}"
            )))
        }
    }

    /// Log out: best-effort server notification, unconditional local cleanup.
    ///
    /// Never fails from the caller's perspective, and is idempotent. The
    /// token is taken and the state flipped in one critical section, so
    /// overlapping logout calls collapse into a single server notification
    /// and a single status transition.
    pub async fn logout(&self) {
        let token = {
            let mut inner = self.lock();
            let token = inner.access_token.take();
            inner.refresh_token = None;
            inner.user = None;
            inner.status = SessionStatus::Unauthenticated;
            token
        };
        self.publish(SessionStatus::Unauthenticated);
        self.clear_persisted();

        if let Some(token) = token {
            let url = format!("{}/auth/logout", self.base_url);
            if let Err(e) = self.http.post(&url).bearer_auth(&token).send().await {
                warn!(error = %e, "Logout notification failed, local cleanup already done");
            }
            debug!("Logged out");
        }
    }

    /// Exchange the refresh token for a new token pair and return the new
    /// access token.
    ///
    /// Callers must go through `RefreshCoordinator` - this operation does not
    /// guard against concurrent invocation itself. Once the session is
    /// unauthenticated no refresh is started until a new login succeeds.
    /// On failure the token pair is left untouched; the transport layer owns
    /// the logout escalation.
    pub(crate) async fn refresh(&self) -> Result<String, AuthError> {
        let refresh_token = {
            let mut inner = self.lock();
            if inner.status == SessionStatus::Unauthenticated {
                return Err(AuthError::SessionExpired);
            }
            let Some(token) = inner.refresh_token.clone() else {
                return Err(AuthError::SessionExpired);
            };
            inner.status = SessionStatus::Refreshing;
            token
        };
        self.publish(SessionStatus::Refreshing);

        let url = format!("{}/auth/refresh", self.base_url);
        let request = self
            .http
            .post(&url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send();

        let outcome: Result<TokenPairResponse, AuthError> =
            match tokio::time::timeout(self.refresh_timeout, request).await {
                Err(_) => Err(AuthError::NetworkFailure(
                    "refresh exchange timed out".to_string(),
                )),
                Ok(Err(e)) => Err(AuthError::NetworkFailure(e.to_string())),
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        response.json().await.map_err(|e| {
                            AuthError::NetworkFailure(format!("unexpected refresh response: {e}"))
                        })
                    } else if status.is_client_error() {
                        debug!(%status, "Refresh token rejected");
                        Err(AuthError::SessionExpired)
                    } else {
                        Err(AuthError::NetworkFailure(format!(
                            "refresh failed with status {status}"
                        )))
                    }
                }
            };

        match outcome {
            Ok(pair) => {
                self.install_tokens(&pair);
                debug!("Token refresh succeeded");
                Ok(pair.access_token)
            }
            Err(e) => {
                self.settle_failed_refresh();
                warn!(error = %e, "Token refresh failed");
                Err(e)
            }
        }
    }

    /// Forcible local-only reset. No network call.
    pub fn clear_auth_state(&self) {
        {
            let mut inner = self.lock();
            inner.access_token = None;
            inner.refresh_token = None;
            inner.user = None;
            inner.status = SessionStatus::Unauthenticated;
        }
        self.publish(SessionStatus::Unauthenticated);
        self.clear_persisted();
    }

    /// Cache the current user in memory and in the credential store.
    ///
    /// There is no identity-fetch endpoint; callers supply whatever user
    /// record they obtained elsewhere.
    pub fn set_current_user(&self, user: User) {
        let record = CachedUser {
            user: user.clone(),
            cached_at: Utc::now(),
        };
        {
            let mut inner = self.lock();
            inner.user = Some(user);
        }
        match serde_json::to_string(&record) {
            Ok(raw) => {
                if let Err(e) = self.store.set(USER_ENTRY, &raw) {
                    warn!(error = %e, "Failed to persist user record");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode user record"),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    /// True when both tokens are present.
    pub fn is_authenticated(&self) -> bool {
        let inner = self.lock();
        inner.access_token.is_some() && inner.refresh_token.is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock().access_token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    /// Observe status transitions, e.g. to redirect to the login view when
    /// the session reaches the terminal unauthenticated state. The channel
    /// only fires on actual transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, status: SessionStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Persist failures are logged, not surfaced - the in-memory session
    /// stays authoritative.
    fn install_tokens(&self, pair: &TokenPairResponse) {
        {
            let mut inner = self.lock();
            inner.access_token = Some(pair.access_token.clone());
            inner.refresh_token = Some(pair.refresh_token.clone());
            inner.status = SessionStatus::Authenticated;
        }
        self.publish(SessionStatus::Authenticated);

        if let Err(e) = self.store.set(ACCESS_TOKEN_ENTRY, &pair.access_token) {
            warn!(error = %e, "Failed to persist access token");
        }
        if let Err(e) = self.store.set(REFRESH_TOKEN_ENTRY, &pair.refresh_token) {
            warn!(error = %e, "Failed to persist refresh token");
        }
    }

    /// Leave the token pair untouched after a failed refresh, but get the
    /// status back to a truthful value. A logout may have raced the exchange,
    /// in which case unauthenticated wins.
    fn settle_failed_refresh(&self) {
        let status = {
            let mut inner = self.lock();
            if inner.status == SessionStatus::Refreshing {
                inner.status =
                    if inner.access_token.is_some() && inner.refresh_token.is_some() {
                        SessionStatus::Authenticated
                    } else {
                        SessionStatus::Unauthenticated
                    };
            }
            inner.status
        };
        self.publish(status);
    }

    fn clear_persisted(&self) {
        for entry in [ACCESS_TOKEN_ENTRY, REFRESH_TOKEN_ENTRY, USER_ENTRY] {
            if let Err(e) = self.store.remove(entry) {
                warn!(entry, error = %e, "Failed to clear persisted credential");
            }
        }
    }
}
