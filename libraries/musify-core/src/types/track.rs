/// Track domain type
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playable track as supplied by the catalog
///
/// Immutable once fetched. The queue and the player hold clones, never
/// mutated copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: String,

    /// Track title
    pub name: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: Option<String>,

    /// Cover art URL
    pub image_url: Option<String>,

    /// Provider-supplied playable URL (e.g. a preview clip)
    pub direct_source_url: Option<String>,

    /// Track duration in milliseconds, when the catalog knows it
    pub duration_ms: Option<u64>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: impl Into<String>, name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artist: artist.into(),
            album: None,
            image_url: None,
            direct_source_url: None,
            duration_ms: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn with_direct_source_url(mut self, url: impl Into<String>) -> Self {
        self.direct_source_url = Some(url.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = Some(duration.as_millis() as u64);
        self
    }

    /// Get the track duration as a Duration
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }

    /// Check that identity and display fields are present
    ///
    /// Id, name and artist must all be non-blank; the source endpoints are
    /// keyed by either the id or the name/artist pair.
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("id", &self.id),
            ("name", &self.name),
            ("artist", &self.artist),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match missing {
            Some((field, _)) => Err(CoreError::InvalidTrack(format!(
                "track field '{}' must not be empty",
                field
            ))),
            None => Ok(()),
        }
    }

    /// Short human label, "Name - Artist"
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.artist)
    }
}
