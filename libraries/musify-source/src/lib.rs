//! Musify - Source Resolution
//!
//! Turns a track into a playable audio URL against an upstream that is
//! expected to fail most of the time.
//!
//! This crate provides:
//! - `SourceResolver`: direct-URL short-circuit, bounded timeout per attempt,
//!   classification into success / server error / timeout, jittered
//!   exponential backoff between retries, and a circuit breaker per provider
//!   that stops calling an endpoint after repeated failed resolutions
//! - `SourceEndpoint` trait with HTTP, URL-template, simulated and scripted
//!   implementations
//!
//! Provider fallback is not done here. The resolver answers for one provider
//! at a time; the player decides whether to ask again with another one.
//!
//! # Example
//!
//! ```rust,no_run
//! use musify_core::Track;
//! use musify_source::{HttpSourceEndpoint, Provider, ResolverConfig, SourceQuery, SourceResolver};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = HttpSourceEndpoint::new(
//!     "stream",
//!     "http://flaky-service:9090",
//!     "/source",
//!     SourceQuery::TrackId,
//! )?;
//!
//! let resolver = SourceResolver::new(&ResolverConfig::default()).with_primary(Arc::new(primary));
//!
//! let track = Track::new("42", "Song", "Artist");
//! let resolution = resolver.resolve(&track, Provider::Primary).await?;
//! println!("{} after {} attempts", resolution.url, resolution.attempts.len());
//! # Ok(())
//! # }
//! ```

mod breaker;
mod endpoint;
mod error;
mod http;
mod resolver;
mod retry;
mod simulated;
mod template;
pub mod types;

// Public exports
pub use breaker::{BreakerState, CircuitBreaker};
pub use endpoint::SourceEndpoint;
pub use error::{EndpointError, ResolveError};
pub use http::{HttpSourceEndpoint, SourceQuery};
pub use resolver::SourceResolver;
pub use retry::RetryPolicy;
pub use simulated::{FlakyEndpoint, ScriptStep, ScriptedEndpoint};
pub use template::{UrlTemplateEndpoint, DEFAULT_FALLBACK_TEMPLATE};
pub use types::{
    is_playable_url, Provider, Resolution, ResolutionAttempt, ResolutionOutcome, ResolverConfig,
};
