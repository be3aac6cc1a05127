//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Only caller mistakes are returned as errors. An upstream that cannot
/// produce a URL is reported through the player's `error` state instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// Queue is empty
    #[error("Queue is empty")]
    EmptyQueue,

    /// Index out of bounds
    #[error("Index out of bounds: {index} (queue length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Track lacks the fields needed to resolve it
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
