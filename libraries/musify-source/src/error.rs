//! Error types for source resolution

use crate::types::{Provider, ResolutionAttempt};
use thiserror::Error;

/// Failure of a single endpoint call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// No response within the allowed time
    #[error("Request timed out")]
    Timeout,

    /// Endpoint answered with an error status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Connection could not be established or was dropped
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// Endpoint answered 200 but the body is not a playable URL
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// Endpoint is misconfigured (bad base URL, bad template)
    #[error("Invalid endpoint configuration: {0}")]
    InvalidConfig(String),
}

/// Definitive resolution failure
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Track lacks the fields needed to look it up. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every attempt against the provider failed
    #[error("Source unavailable from {provider} after {n} attempts", n = .attempts.len())]
    SourceUnavailable {
        provider: Provider,
        attempts: Vec<ResolutionAttempt>,
    },

    /// Provider's circuit is open; no call was made
    #[error("Source unavailable from {provider}: circuit open")]
    CircuitOpen { provider: Provider },
}

impl ResolveError {
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    /// Attempts made before giving up (empty unless the endpoint was called)
    pub fn attempts(&self) -> &[ResolutionAttempt] {
        match self {
            Self::InvalidRequest(_) | Self::CircuitOpen { .. } => &[],
            Self::SourceUnavailable { attempts, .. } => attempts,
        }
    }
}
