//! In-memory catalog
//!
//! Used by tests and by the CLI's offline demo mode.

use crate::error::Result;
use crate::traits::Catalog;
use crate::types::Track;
use async_trait::async_trait;

/// Catalog backed by a fixed list of tracks
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tracks: Vec<Track>,
}

impl InMemoryCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>> {
        let needle = query.trim().to_lowercase();

        let matches = self
            .tracks
            .iter()
            .filter(|t| {
                needle.is_empty()
                    || t.name.to_lowercase().contains(&needle)
                    || t.artist.to_lowercase().contains(&needle)
                    || t
                        .album
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&needle))
            })
            .take(limit)
            .cloned()
            .collect();

        Ok(matches)
    }

    async fn track(&self, id: &str) -> Result<Option<Track>> {
        Ok(self.tracks.iter().find(|t| t.id == id).cloned())
    }
}
