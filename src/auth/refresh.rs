//! Single-flight coordination of the token refresh exchange.
//!
//! Any number of requests can fail with 401 at nearly the same moment. At
//! most one refresh exchange may be in flight: the first caller starts it,
//! everyone else joins the pending exchange and receives a clone of the same
//! outcome. The coordinator never retries a failed exchange - the failure
//! propagates to the transport layer, which owns the logout escalation.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::auth::error::AuthError;
use crate::auth::session::SessionState;

type RefreshFuture = Shared<BoxFuture<'static, Result<String, AuthError>>>;

pub struct RefreshCoordinator {
    session: Arc<SessionState>,
    /// The single pending exchange, if any. Locked only for non-suspending
    /// check-and-set sections.
    pending: Mutex<Option<RefreshFuture>>,
}

impl RefreshCoordinator {
    pub fn new(session: Arc<SessionState>) -> Self {
        Self {
            session,
            pending: Mutex::new(None),
        }
    }

    /// Obtain a refreshed access token, joining any refresh already underway.
    pub async fn obtain_refreshed_token(&self) -> Result<String, AuthError> {
        let session = Arc::clone(&self.session);
        self.join_or_start(move || async move { session.refresh().await }.boxed())
            .await
    }

    /// The check-and-set happens in one critical section with no suspension
    /// point, so interleaved callers can never start two exchanges.
    async fn join_or_start<F>(&self, start: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<String, AuthError>>,
    {
        let (exchange, joined) = {
            let mut pending = self.lock_pending();
            match pending.as_ref() {
                Some(existing) => (existing.clone(), true),
                None => {
                    let exchange = start().shared();
                    *pending = Some(exchange.clone());
                    (exchange, false)
                }
            }
        };
        if joined {
            debug!("Joining pending token refresh");
        } else {
            debug!("Starting token refresh exchange");
        }

        let result = exchange.clone().await;

        // Whoever observes completion first discards the pending handle; the
        // ptr_eq guard keeps a later exchange from being discarded by a
        // straggler from this one.
        {
            let mut pending = self.lock_pending();
            if pending.as_ref().is_some_and(|current| current.ptr_eq(&exchange)) {
                *pending = None;
            }
        }
        result
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<RefreshFuture>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
