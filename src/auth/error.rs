use thiserror::Error;

/// Failures of the authentication protocol.
///
/// `Clone` is required because a single refresh outcome is broadcast to every
/// request waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login was rejected by the server. User-correctable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Transient transport-level failure. No session state was changed.
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The refresh exchange failed or the retry budget was exhausted.
    /// The session has been (or is being) logged out.
    #[error("Session expired")]
    SessionExpired,

    /// Persisted auth state was unparseable. Recovered internally by
    /// resetting to a fresh unauthenticated state; never surfaced by startup.
    #[error("Corrupted local auth state")]
    CorruptedLocalState,
}
