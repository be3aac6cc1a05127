//! Playback history tracking
//!
//! Maintains a bounded, in-session list of tracks that actually started
//! playing. Not persisted.

use musify_core::Track;
use std::collections::VecDeque;

/// Playback history with bounded size
///
/// Ring buffer that discards the oldest entry once full.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    tracks: VecDeque<Track>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Add track to history
    ///
    /// If history is full, oldest track is discarded
    pub fn push(&mut self, track: Track) {
        if self.max_size == 0 {
            return;
        }
        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track);
    }

    /// All tracks, oldest first
    pub fn tracks(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}
