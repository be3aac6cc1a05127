//! Core types for playback management

use musify_core::Track;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Nothing playing
    #[default]
    Stopped,

    /// Resolving the audio source
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Resolution or playback failed; `retry` starts over
    Error,
}

impl PlaybackStatus {
    /// Playing or paused, i.e. a resolved track is loaded in the transport
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Off -> All -> One -> Off
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Why the player is in the `error` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Track could not be looked up (missing id, name or artist)
    InvalidRequest,

    /// Every provider gave up
    SourceUnavailable,

    /// Result for a request that was superseded. Discarded, never stored in state.
    StaleResult,

    /// Transport failed to play the resolved URL
    MediaError,
}

/// Queue navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Observable player state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaybackState {
    pub status: PlaybackStatus,

    /// Track being loaded or played
    pub current_track: Option<Track>,

    /// URL handed to the transport, set once resolution succeeds
    pub resolved_audio_url: Option<String>,

    /// Elapsed time in the current track
    pub position: Duration,

    /// Total duration, `None` while unknown
    pub duration: Option<Duration>,

    /// Set only while `status` is `Error`
    pub error: Option<ErrorKind>,
}

impl PlaybackState {
    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|track| track.id.as_str())
    }
}

/// Read-only copy of the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub tracks: Vec<Track>,
    pub current_index: Option<usize>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

/// Configuration for the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Maximum history size (default: 50)
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Initial shuffle flag (default: false)
    #[serde(default)]
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Ask the secondary provider once the primary gives up (default: true)
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,

    /// Wall-clock driver tick in milliseconds (default: 250)
    #[serde(default = "default_wall_clock_ms")]
    pub wall_clock_ms: u64,
}

impl PlaybackConfig {
    pub fn wall_clock_period(&self) -> Duration {
        Duration::from_millis(self.wall_clock_ms.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            shuffle: false,
            repeat: RepeatMode::Off,
            fallback_enabled: default_fallback_enabled(),
            wall_clock_ms: default_wall_clock_ms(),
        }
    }
}

fn default_history_size() -> usize {
    50
}

fn default_fallback_enabled() -> bool {
    true
}

fn default_wall_clock_ms() -> u64 {
    250
}
