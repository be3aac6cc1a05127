//! Types for Musify API requests and responses.

use chrono::NaiveDateTime;
use musify_core::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for connecting to the Musify API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:8080/api")
    pub url: String,
    /// Access token from a previous login, if any
    pub access_token: Option<String>,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}

// =============================================================================
// Response Envelope
// =============================================================================

/// Envelope wrapping every API payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
    /// Server-local time, formatted without an offset
    pub timestamp: Option<String>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Parse the envelope timestamp, if present and well formed
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?;
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }

    /// Best human-readable explanation the server gave
    pub fn reason(&self) -> Option<String> {
        match (&self.message, &self.error) {
            (Some(m), Some(e)) => Some(format!("{}: {}", m, e)),
            (Some(m), None) => Some(m.clone()),
            (None, Some(e)) => Some(e.clone()),
            (None, None) => None,
        }
    }
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload of a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Track as returned by the catalog endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTrack {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub release_year: Option<i32>,
    pub genre: Option<String>,
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub premium: bool,
    pub cover_url: Option<String>,
    /// Provider preview clip, playable as-is
    #[serde(default)]
    pub preview_url: Option<String>,
}

impl From<CatalogTrack> for Track {
    fn from(t: CatalogTrack) -> Self {
        let mut track = Track::new(t.id.to_string(), t.title, t.artist);
        track.album = t.album;
        track.image_url = t.cover_url;
        track.direct_source_url = t.preview_url;
        if let Some(secs) = t.duration_seconds.filter(|s| *s > 0) {
            track = track.with_duration(Duration::from_secs(u64::from(secs)));
        }
        track
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_timestamp_parses_local_datetime() {
        let envelope: ApiResponse<()> = serde_json::from_str(
            r#"{"success":true,"message":"ok","timestamp":"2025-11-11T13:41:45.123456"}"#,
        )
        .unwrap();

        let ts = envelope.timestamp().unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M").to_string(), "2025-11-11 13:41");
        assert!(envelope.data.is_none());
    }

    #[test]
    fn envelope_reason_combines_message_and_error() {
        let envelope: ApiResponse<()> = serde_json::from_str(
            r#"{"success":false,"message":"Pista no encontrada","error":"No existe"}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.reason().as_deref(),
            Some("Pista no encontrada: No existe")
        );
    }

    #[test]
    fn catalog_track_maps_to_track() {
        let json = r#"{
            "id": 7,
            "title": "Song",
            "artist": "Artist",
            "album": "Album",
            "releaseYear": 2001,
            "genre": "Rock",
            "durationSeconds": 215,
            "premium": false,
            "coverUrl": "https://img.example/7.jpg"
        }"#;
        let track: Track = serde_json::from_str::<CatalogTrack>(json).unwrap().into();

        assert_eq!(track.id, "7");
        assert_eq!(track.name, "Song");
        assert_eq!(track.album.as_deref(), Some("Album"));
        assert_eq!(track.image_url.as_deref(), Some("https://img.example/7.jpg"));
        assert_eq!(track.duration(), Some(Duration::from_secs(215)));
        assert!(track.direct_source_url.is_none());
        assert!(track.validate().is_ok());
    }

    #[test]
    fn zero_duration_is_unknown() {
        let json = r#"{"id":1,"title":"A","artist":"B","durationSeconds":0}"#;
        let track: Track = serde_json::from_str::<CatalogTrack>(json).unwrap().into();
        assert!(track.duration().is_none());
    }
}
