//! Authenticated transport for the NFT admin API.
//!
//! `ApiClient` wraps every outgoing request: it attaches the current bearer
//! token, and on a 401 drives the retry-once-after-refresh protocol through
//! the `RefreshCoordinator`, escalating to logout when recovery fails.
//! Application code calls the typed helpers and never sees any of this -
//! every session failure surfaces as the single `SessionExpired` shape.
//!
//! Per request the protocol is a small state machine:
//! send -> done on anything but 401; 401 -> await refresh -> replay exactly
//! once -> done, or escalate to logout and fail with `SessionExpired`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{multipart, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{AuthError, RefreshCoordinator, SessionState, SessionStatus};
use crate::config::Config;

use super::ApiError;

/// Body of an outgoing request, kept in an owned form so the request can be
/// replayed after a token refresh.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// One field of a multipart form.
#[derive(Debug, Clone)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        bytes: Vec<u8>,
    },
}

/// Handle for cancelling a request while it awaits a token refresh.
/// A cancelled request is never replayed.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One outgoing call and its retry bookkeeping. `retried` transitions
/// false -> true at most once.
#[derive(Debug)]
pub struct RequestEnvelope {
    method: Method,
    path: String,
    body: RequestBody,
    retried: bool,
    cancel: CancelHandle,
}

impl RequestEnvelope {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            retried: false,
            cancel: CancelHandle::default(),
        }
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

/// Authenticated API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the session and coordinator are shared.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionState>,
    refresh: Arc<RefreshCoordinator>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<SessionState>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        let refresh = Arc::new(RefreshCoordinator::new(Arc::clone(&session)));

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            refresh,
        })
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Send a request through the session protocol.
    ///
    /// Non-401 responses pass through unchanged, including other error
    /// statuses - those are the typed helpers' concern. A 401 triggers one
    /// refresh-and-replay cycle; irrecoverable failures log the session out
    /// and reject with `SessionExpired`.
    pub async fn execute(&self, mut envelope: RequestEnvelope) -> Result<Response, ApiError> {
        let response = self.send(&envelope).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if envelope.retried {
            self.escalate().await;
            return Err(AuthError::SessionExpired.into());
        }
        envelope.retried = true;
        debug!(path = %envelope.path, "Request returned 401, refreshing session");

        match self.refresh.obtain_refreshed_token().await {
            Ok(_) => {
                if envelope.cancel.is_cancelled() {
                    debug!(path = %envelope.path, "Request cancelled while awaiting refresh");
                    return Err(ApiError::Cancelled);
                }
                let replay = self.send(&envelope).await?;
                if replay.status() == StatusCode::UNAUTHORIZED {
                    // The replay gets no second chance.
                    self.escalate().await;
                    return Err(AuthError::SessionExpired.into());
                }
                Ok(replay)
            }
            Err(e) => {
                warn!(path = %envelope.path, error = %e, "Session refresh failed, logging out");
                self.escalate().await;
                Err(AuthError::SessionExpired.into())
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let envelope = RequestEnvelope::new(Method::GET, path);
        let response = self.execute(envelope).await?;
        Self::parse(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.json_envelope(path, body)?).await?;
        Self::parse(response).await
    }

    /// POST whose response body is irrelevant to the caller.
    pub async fn post_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let response = self.execute(self.json_envelope(path, body)?).await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// Multipart POST, e.g. file uploads. The fields are owned so the
    /// request stays replayable.
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: Vec<FormField>,
    ) -> Result<(), ApiError> {
        let envelope = RequestEnvelope::new(Method::POST, path).with_multipart(fields);
        let response = self.execute(envelope).await?;
        Self::check_response(response).await?;
        Ok(())
    }

    fn json_envelope<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RequestEnvelope, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("failed to encode request body: {e}")))?;
        Ok(RequestEnvelope::new(Method::POST, path).with_json(value))
    }

    /// One logout transition per failed refresh cycle: skip the call when the
    /// session is already logged out. `logout` itself collapses any races
    /// this check leaves open.
    async fn escalate(&self) {
        if self.session.status() != SessionStatus::Unauthenticated {
            self.session.logout().await;
        }
    }

    async fn send(&self, envelope: &RequestEnvelope) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, envelope.path);
        let mut request = self.http.request(envelope.method.clone(), &url);

        // The token is re-read on every send, so a replay picks up the
        // refreshed token automatically.
        if let Some(token) = self.session.access_token() {
            request = request.bearer_auth(token);
        }
        request = match &envelope.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart(fields) => request.multipart(build_form(fields)),
        };

        request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn check_response(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

fn build_form(fields: &[FormField]) -> multipart::Form {
    let mut form = multipart::Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File {
                name,
                file_name,
                bytes,
            } => form.part(
                name.clone(),
                multipart::Part::bytes(bytes.clone()).file_name(file_name.clone()),
            ),
        };
    }
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_starts_unretried_with_empty_body() {
        let envelope = RequestEnvelope::new(Method::GET, "/api/nft/1");
        assert!(!envelope.retried);
        assert!(matches!(envelope.body, RequestBody::Empty));
        assert!(!envelope.cancel.is_cancelled());
    }

    #[test]
    fn cancel_handle_reaches_the_envelope() {
        let envelope = RequestEnvelope::new(Method::GET, "/api/nft/1");
        let handle = envelope.cancel_handle();
        handle.cancel();
        assert!(envelope.cancel.is_cancelled());
    }
}
