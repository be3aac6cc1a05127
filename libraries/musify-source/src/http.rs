//! HTTP source endpoint.

use crate::endpoint::SourceEndpoint;
use crate::error::EndpointError;
use async_trait::async_trait;
use musify_core::{AuthProvider, Track};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How the track is passed to the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceQuery {
    /// `?trackId={track.id}`
    TrackId,

    /// `?name={track.name}&artist={track.artist}`
    NameArtist,
}

/// Source endpoint reached with a plain `GET`
///
/// A 200 answer carries the URL as its text body. Any other status is a
/// server error. The per-attempt deadline belongs to the resolver; the
/// client timeout here only stops abandoned sockets from piling up.
///
/// # Example
///
/// ```ignore
/// use musify_source::{HttpSourceEndpoint, SourceQuery};
///
/// // GET http://flaky-service:9090/source?trackId=42
/// let primary = HttpSourceEndpoint::new("stream", "http://flaky-service:9090", "/source", SourceQuery::TrackId)?;
///
/// // GET http://api:8080/api/youtube/audio?name=Song&artist=Artist
/// let secondary = HttpSourceEndpoint::new("youtube", "http://api:8080", "/api/youtube/audio", SourceQuery::NameArtist)?;
/// ```
pub struct HttpSourceEndpoint {
    name: String,
    http: Client,
    url: String,
    query: SourceQuery,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl HttpSourceEndpoint {
    /// Create a new endpoint at `base_url` + `path`.
    pub fn new(
        name: impl Into<String>,
        base_url: &str,
        path: &str,
        query: SourceQuery,
    ) -> Result<Self, EndpointError> {
        if base_url.is_empty() {
            return Err(EndpointError::InvalidConfig("URL cannot be empty".into()));
        }

        let base = base_url.trim_end_matches('/');
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(EndpointError::InvalidConfig(
                "URL must start with http:// or https://".into(),
            ));
        }

        let url = format!("{}/{}", base, path.trim_start_matches('/'));
        url::Url::parse(&url).map_err(|e| EndpointError::InvalidConfig(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Musify/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EndpointError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            http,
            url,
            query,
            auth: None,
        })
    }

    /// Send a bearer token with every request when one is available.
    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Full endpoint URL without the query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn query_pairs<'a>(&self, track: &'a Track) -> Vec<(&'static str, &'a str)> {
        match self.query {
            SourceQuery::TrackId => vec![("trackId", track.id.as_str())],
            SourceQuery::NameArtist => vec![
                ("name", track.name.as_str()),
                ("artist", track.artist.as_str()),
            ],
        }
    }
}

#[async_trait]
impl SourceEndpoint for HttpSourceEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, track: &Track) -> Result<String, EndpointError> {
        debug!(endpoint = %self.name, url = %self.url, track_id = %track.id, "Requesting source");

        let mut request = self.http.get(&self.url).query(&self.query_pairs(track));
        if let Some(token) = self.auth.as_ref().and_then(|auth| auth.bearer_token()) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                EndpointError::Timeout
            } else {
                EndpointError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                endpoint = %self.name,
                status = status.as_u16(),
                message = %message,
                "Source endpoint returned error"
            );
            return Err(EndpointError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                EndpointError::Timeout
            } else {
                EndpointError::Unreachable(e.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_base_urls() {
        assert!(matches!(
            HttpSourceEndpoint::new("x", "", "/source", SourceQuery::TrackId),
            Err(EndpointError::InvalidConfig(_))
        ));
        assert!(matches!(
            HttpSourceEndpoint::new("x", "flaky-service:9090", "/source", SourceQuery::TrackId),
            Err(EndpointError::InvalidConfig(_))
        ));
    }

    #[test]
    fn joins_base_and_path() {
        let endpoint =
            HttpSourceEndpoint::new("x", "http://flaky-service:9090/", "source", SourceQuery::TrackId)
                .unwrap();
        assert_eq!(endpoint.url(), "http://flaky-service:9090/source");
    }

    #[test]
    fn query_pairs_follow_mode() {
        let track = Track::new("T1", "Song", "Artist");

        let by_id =
            HttpSourceEndpoint::new("x", "http://h", "/s", SourceQuery::TrackId).unwrap();
        assert_eq!(by_id.query_pairs(&track), vec![("trackId", "T1")]);

        let by_name =
            HttpSourceEndpoint::new("x", "http://h", "/s", SourceQuery::NameArtist).unwrap();
        assert_eq!(
            by_name.query_pairs(&track),
            vec![("name", "Song"), ("artist", "Artist")]
        );
    }
}
