//! Musify API Client
//!
//! HTTP client for the Musify catalog and authentication endpoints.
//!
//! # Features
//!
//! - **Authentication**: Login with email/password, shared bearer token
//! - **Catalog**: List, search and look up tracks
//! - **Envelope handling**: Every payload is unwrapped from the API's
//!   `{ success, message, data, timestamp }` envelope
//!
//! [`MusifyClient`] implements [`musify_core::Catalog`], so it can stand in
//! for the in-memory catalog anywhere tracks are loaded.

mod auth;
mod catalog;
mod client;
mod error;
mod response;
mod types;

pub use auth::AuthClient;
pub use catalog::CatalogClient;
pub use client::MusifyClient;
pub use error::{ClientError, Result};
pub use types::{ApiResponse, CatalogTrack, ClientConfig, LoginRequest, TokenResponse};
