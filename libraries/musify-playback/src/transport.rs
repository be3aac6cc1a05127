//! Playback transport
//!
//! Platform-specific audio output is provided through `PlaybackTransport`.
//! The player issues commands; the platform feeds back `TransportSignal`s
//! via `Player::handle_signal`.

use crate::position::ProgressTick;
use musify_core::Track;
use std::time::Duration;

/// Audio output driven by the player
///
/// Methods are called while the player holds its state lock, so they must
/// return quickly and must not call back into the player.
pub trait PlaybackTransport: Send + Sync {
    /// Start playing `url` for `track` from `start`
    fn load(&self, track: &Track, url: &str, start: Duration);

    fn pause(&self);

    fn resume(&self);

    fn seek(&self, position: Duration);

    /// Stop output and drop the loaded source
    fn stop(&self);
}

/// Transport that outputs nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTransport;

impl PlaybackTransport for NullTransport {
    fn load(&self, _track: &Track, _url: &str, _start: Duration) {}

    fn pause(&self) {}

    fn resume(&self) {}

    fn seek(&self, _position: Duration) {}

    fn stop(&self) {}
}

/// Feedback from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    /// Periodic progress
    Progress(ProgressTick),

    /// Playback reached the end of the source
    Ended { track_id: String },

    /// Source could not be decoded or played
    Error { track_id: String, message: String },
}
