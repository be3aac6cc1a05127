//! Main Musify API client.

use crate::auth::AuthClient;
use crate::catalog::CatalogClient;
use crate::error::{ClientError, Result};
use crate::types::{ClientConfig, TokenResponse};
use async_trait::async_trait;
use musify_core::{AuthProvider, BearerToken, Catalog, CoreError, TokenStore, Track};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Main client for the Musify API.
///
/// Holds the session token in a shared [`TokenStore`], so other HTTP
/// collaborators (e.g. the source endpoint) can authenticate with the same
/// login.
///
/// # Example
///
/// ```no_run
/// use musify_client::{ClientConfig, MusifyClient};
/// use musify_core::Catalog;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = MusifyClient::new(ClientConfig::new("http://localhost:8080/api"))?;
/// client.login("user@example.com", "password123").await?;
///
/// let tracks = client.search("queen", 10).await?;
/// println!("Found {} tracks", tracks.len());
/// # Ok(())
/// # }
/// ```
pub struct MusifyClient {
    http: Client,
    base_url: Url,
    tokens: Arc<TokenStore>,
}

impl MusifyClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let trimmed = config.url.trim_end_matches('/');
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let base_url =
            Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Musify/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let tokens = match config.access_token {
            Some(token) => TokenStore::with_token(BearerToken::new(token)),
            None => TokenStore::new(),
        };

        Ok(Self {
            http,
            base_url,
            tokens: Arc::new(tokens),
        })
    }

    /// Get the API base URL.
    pub fn url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Shared token store backing this client's session.
    pub fn token_store(&self) -> Arc<TokenStore> {
        Arc::clone(&self.tokens)
    }

    /// Check if the client holds a usable access token.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    /// Login with email and password.
    ///
    /// On success, the access token is stored for subsequent requests.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let response = self.auth().login(email, password).await?;
        self.tokens.set(BearerToken::new(response.access_token.clone()));
        Ok(response)
    }

    /// Set a token directly (e.g., from stored credentials).
    pub fn set_token(&self, token: BearerToken) {
        self.tokens.set(token);
    }

    /// Log out and clear the stored token.
    ///
    /// The local token is dropped even when the server call fails.
    pub async fn logout(&self) {
        if let Some(token) = self.tokens.bearer_token() {
            if let Err(e) = self.auth().logout(&token).await {
                warn!(error = %e, "Server-side logout failed");
            }
        }
        self.tokens.clear();
        info!("Logged out");
    }

    /// Authentication sub-client.
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(&self.http, &self.base_url)
    }

    /// Catalog sub-client, authenticated with the current token if any.
    pub fn catalog(&self) -> CatalogClient<'_> {
        CatalogClient::new(&self.http, &self.base_url, self.tokens.bearer_token())
    }
}

#[async_trait]
impl Catalog for MusifyClient {
    async fn search(&self, query: &str, limit: usize) -> musify_core::Result<Vec<Track>> {
        let catalog = self.catalog();
        let mut tracks = if query.trim().is_empty() {
            catalog.all_tracks().await?
        } else {
            catalog.search(query.trim()).await?
        };
        tracks.truncate(limit);
        debug!(query = %query, results = tracks.len(), "Catalog search");
        Ok(tracks)
    }

    async fn track(&self, id: &str) -> musify_core::Result<Option<Track>> {
        if id.trim().is_empty() {
            return Err(CoreError::InvalidTrack("id is blank".into()));
        }
        Ok(self.catalog().track(id).await?)
    }
}

/// Append path segments to the API base URL, percent-encoding each one.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidUrl(format!("{} cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
