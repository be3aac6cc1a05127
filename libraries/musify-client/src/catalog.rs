//! Catalog lookups against the Musify API.

use crate::error::{ClientError, Result};
use crate::response::decode;
use crate::types::CatalogTrack;
use musify_core::Track;
use reqwest::{Client, RequestBuilder};
use tracing::debug;
use url::Url;

/// Catalog client for the Musify API.
///
/// Requests carry the bearer token when one was available at creation.
pub struct CatalogClient<'a> {
    http: &'a Client,
    base_url: &'a Url,
    access_token: Option<String>,
}

impl<'a> CatalogClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a Url, access_token: Option<String>) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Get every track in the catalog.
    pub async fn all_tracks(&self) -> Result<Vec<Track>> {
        let url = crate::client::join(self.base_url, &["tracks"])?;
        debug!(url = %url, "Fetching catalog");

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let tracks = decode::<Vec<CatalogTrack>>(response, "tracks").await?.unwrap_or_default();
        debug!(tracks = tracks.len(), "Fetched catalog");

        Ok(tracks.into_iter().map(Track::from).collect())
    }

    /// Search tracks by title, artist or album.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let url = crate::client::join(self.base_url, &["tracks", "search"])?;
        debug!(url = %url, query = %query, "Searching catalog");

        let response = self
            .authorize(self.http.get(url).query(&[("q", query)]))
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let tracks = decode::<Vec<CatalogTrack>>(response, "search").await?.unwrap_or_default();
        debug!(query = %query, results = tracks.len(), "Search complete");

        Ok(tracks.into_iter().map(Track::from).collect())
    }

    /// Get a single track by id.
    ///
    /// Returns `Ok(None)` when the catalog has no such track.
    pub async fn track(&self, track_id: &str) -> Result<Option<Track>> {
        let url = crate::client::join(self.base_url, &["tracks", track_id])?;
        debug!(url = %url, track_id = %track_id, "Fetching track");

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(ClientError::from_send)?;

        match decode::<CatalogTrack>(response, "track").await {
            Ok(track) => Ok(track.map(Track::from)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
