//! Error types for the remote tabular store

use std::time::Duration;

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// A failure while talking to the tabular store backend.
///
/// Transient variants (rate limiting, network faults, 5xx responses) are
/// retried by the resilience layer; everything else propagates immediately.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend asked us to slow down (HTTP 429 or quota exhaustion).
    #[error("rate limited by the remote store")]
    RateLimited {
        /// Server-suggested wait, when the response carried one.
        retry_after: Option<Duration>,
    },

    /// Connection-level failure: DNS, TLS, timeout, broken pipe.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Credentials rejected or missing scopes. Never retried.
    #[error("authentication rejected by the remote store: {0}")]
    Auth(String),

    /// The named table (worksheet) does not exist in the store.
    #[error("table '{0}' not found in the remote store")]
    TableNotFound(String),

    /// The request itself is malformed (bad range, wrong shape). Never retried.
    #[error("malformed request: {0}")]
    InvalidRequest(String),

    /// Any other remote error, tagged with the HTTP status we got back.
    #[error("remote store error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl StoreError {
    /// Whether a retry with backoff has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::RateLimited { .. } => true,
            StoreError::Network(_) => true,
            StoreError::Api { status, .. } => (500..=599).contains(status),
            StoreError::Auth(_) | StoreError::TableNotFound(_) | StoreError::InvalidRequest(_) => {
                false
            }
        }
    }

    /// Server-suggested minimum delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StoreError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
