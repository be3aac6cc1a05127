//! Track source endpoint trait
//!
//! Abstracts the upstream that maps a track to a playable URL.

use crate::error::EndpointError;
use async_trait::async_trait;
use musify_core::Track;

/// Upstream that maps a track to a playable URL
///
/// Implementors make exactly one call per `fetch`. They don't retry and
/// don't need to enforce a deadline: the resolver wraps every call in its own
/// timeout and treats a future that never completes as a timeout.
#[async_trait]
pub trait SourceEndpoint: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Ask the upstream for a URL
    ///
    /// # Returns
    /// * `Ok(body)` - Raw response body; the resolver checks that it is a URL
    /// * `Err(_)` - Error status, transport failure or timeout
    async fn fetch(&self, track: &Track) -> Result<String, EndpointError>;
}
