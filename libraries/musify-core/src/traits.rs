/// Collaborator traits for Musify
use crate::error::Result;
use crate::types::Track;
use async_trait::async_trait;

/// Read-only access to the catalog/search service
///
/// Implemented by the HTTP catalog client and by `InMemoryCatalog`.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Search tracks matching a free-text query
    ///
    /// Returns at most `limit` tracks. Ranking is up to the backend.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>>;

    /// Get a single track by id
    ///
    /// Returns `Ok(None)` when the catalog has no such track.
    async fn track(&self, id: &str) -> Result<Option<Track>>;
}

/// Source of an opaque bearer token
///
/// The token format is not inspected. Absence or expiry simply means
/// "unauthenticated".
pub trait AuthProvider: Send + Sync {
    /// Current bearer token, if any and not expired
    fn bearer_token(&self) -> Option<String>;

    /// Whether a usable token is available
    fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}
