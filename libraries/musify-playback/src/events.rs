//! Playback Events
//!
//! Event-based communication for UI synchronization. Events are emitted at
//! key points:
//! - Status changes (loading/playing/paused/stopped/error)
//! - Track changes (immediately when a new track starts loading)
//! - Source resolution results, with diagnostics
//! - Position updates
//! - Queue changes

use crate::types::{ErrorKind, PlaybackStatus};
use musify_source::Provider;
use serde::{Deserialize, Serialize};

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// Player status changed
    StateChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// A different track became current
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// A playable URL was found
    SourceResolved {
        track_id: String,
        provider: Provider,
        /// Endpoint calls made across all providers (0 for a direct URL)
        attempts: usize,
        /// URL came straight from the track
        direct: bool,
        /// Time from the play request to a playable URL
        time_to_play_ms: u64,
    },

    /// A provider gave up on a track
    ResolutionFailed {
        track_id: String,
        provider: Provider,
        attempts: usize,
        /// Another provider will be asked next
        will_fall_back: bool,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: String,
    },

    /// Position update
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total track duration, when known
        duration_ms: Option<u64>,
    },

    /// Queue changed (tracks added, replaced or cleared)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Player entered the error state
    Error {
        kind: ErrorKind,
        /// Error message
        message: String,
    },
}
