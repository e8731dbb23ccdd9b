//! Provider-boundary error type.

use std::time::Duration;

use thiserror::Error;

/// Failure reported by a [`RouteProvider`][crate::RouteProvider] for a
/// single call.  The requester decides which of these are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("no route found: {0}")]
    NoRoute(String),

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Network failures and rate limiting may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Network(_) | ProviderError::RateLimited { .. })
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
