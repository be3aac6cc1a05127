//! Musify Core
//!
//! Platform-agnostic core types and collaborator traits for Musify.
//!
//! This crate provides the building blocks shared by the source resolver,
//! the playback engine and the catalog client.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`
//! - **Collaborator Traits**: `Catalog`, `AuthProvider`
//! - **Auth helpers**: `BearerToken`, `TokenStore`, route guard
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use musify_core::Track;
//!
//! let track = Track::new("42", "Song Title", "Artist Name")
//!     .with_album("Album Name")
//!     .with_direct_source_url("https://cdn.example/preview/42.mp3");
//!
//! assert!(track.validate().is_ok());
//! assert!(track.direct_source_url.is_some());
//! ```

#![forbid(unsafe_code)]

pub mod auth;
pub mod catalog;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use auth::{guard, Anonymous, BearerToken, RouteAccess, TokenStore};
pub use catalog::InMemoryCatalog;
pub use error::{CoreError, Result};
pub use traits::{AuthProvider, Catalog};
pub use types::Track;
