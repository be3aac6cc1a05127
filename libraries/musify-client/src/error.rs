//! Error types for the Musify API client.

use musify_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to the Musify API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Server answered 2xx but flagged the envelope as unsuccessful
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication required but no usable token
    #[error("Authentication required")]
    AuthRequired,

    /// Login failed (bad credentials)
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Invalid API base URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ClientError {
    pub(crate) fn from_send(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::ServerUnreachable(e.to_string())
        } else {
            Self::Request(e)
        }
    }
}

impl From<ClientError> for CoreError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::AuthRequired | ClientError::AuthFailed(_) => Self::Unauthenticated,
            ClientError::NotFound(what) => Self::TrackNotFound(what),
            other => Self::catalog(other.to_string()),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
