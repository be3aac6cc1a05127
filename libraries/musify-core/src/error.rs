/// Core error types for Musify
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Musify
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Track is missing identity or display fields required for playback
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// Track not found in the catalog
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// Catalog backend failure
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Caller is not authenticated
    #[error("Authentication required")]
    Unauthenticated,
}

impl CoreError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }
}
