/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(#[from] musify_source::EndpointError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] musify_core::CoreError),

    #[error("Client error: {0}")]
    Client(#[from] musify_client::ClientError),

    #[error("No tracks to play: {0}")]
    NoTracks(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
