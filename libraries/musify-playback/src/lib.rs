//! Musify - Playback Orchestration
//!
//! Drives continuous playback on top of an unreliable audio source.
//!
//! This crate provides:
//! - `Player`: the playback state machine (play, pause, resume, next,
//!   previous, seek, stop, retry) with provider fallback
//! - `Queue`: ordered tracks with shuffle (index selection, no reordering)
//!   and repeat (Off, All, One)
//! - `PositionTracker`: progress following with a stale-signal guard and
//!   exactly-once completion
//! - Playback history (in-session, bounded)
//! - A latest-state stream and an event stream for UIs
//!
//! # Architecture
//!
//! `musify-playback` never touches audio itself. Output is delegated to a
//! `PlaybackTransport`, which reports back through `TransportSignal`s.
//! Where the transport reports nothing, `Player::spawn_wall_clock` advances
//! the position from the tokio clock.
//!
//! # Example: Basic Playback
//!
//! ```rust,no_run
//! use musify_core::Track;
//! use musify_playback::{NullTransport, PlaybackConfig, PlaybackStatus, Player};
//! use musify_source::{FlakyEndpoint, ResolverConfig, SourceResolver, UrlTemplateEndpoint};
//! use std::sync::Arc;
//!
//! # async fn run() -> musify_playback::Result<()> {
//! let resolver = SourceResolver::new(&ResolverConfig::default())
//!     .with_primary(Arc::new(FlakyEndpoint::new()))
//!     .with_secondary(Arc::new(UrlTemplateEndpoint::default()));
//!
//! let player = Player::new(Arc::new(resolver), Arc::new(NullTransport), PlaybackConfig::default());
//!
//! let tracks = vec![
//!     Track::new("T1", "First", "Artist"),
//!     Track::new("T2", "Second", "Artist"),
//! ];
//! let state = player.play_queue(tracks, 0).await?;
//! assert_eq!(state.status, PlaybackStatus::Playing);
//!
//! player.pause();
//! player.resume();
//! player.next().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use musify_playback::{Queue, RepeatMode};
//! use musify_playback::types::Direction;
//! use musify_core::Track;
//!
//! let mut queue = Queue::new();
//! queue.set_queue(vec![Track::new("1", "A", "X"), Track::new("2", "B", "X")], 1).unwrap();
//!
//! queue.set_repeat(RepeatMode::All);
//! assert_eq!(queue.advance(Direction::Next).map(|t| t.id.as_str()), Some("1"));
//! ```

mod error;
mod events;
mod history;
mod manager;
mod position;
mod queue;
mod shuffle;
mod transport;
pub mod types;

// Public exports
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use history::History;
pub use manager::Player;
pub use position::{PositionTracker, ProgressTick, TickOutcome};
pub use queue::Queue;
pub use transport::{NullTransport, PlaybackTransport, TransportSignal};
pub use types::{
    Direction, ErrorKind, PlaybackConfig, PlaybackState, PlaybackStatus, QueueSnapshot, RepeatMode,
};
