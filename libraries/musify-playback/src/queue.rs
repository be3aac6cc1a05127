//! Playback queue
//!
//! Ordered track list with a current index plus shuffle and repeat flags.
//!
//! Index selection for `advance`:
//!
//! ```text
//! repeat  | next past the end       | shuffled next
//! --------+-------------------------+---------------------------------
//! Off     | None                    | random unvisited index, None when
//!         |                         | every index was visited this pass
//! All     | wraps to 0              | random index != current
//! One     | replays current         | replays current
//! ```
//!
//! `previous` is always "index minus one": None at 0 for `Off`, wraps to
//! the last index for `All`, replays current for `One`.

use crate::error::{PlaybackError, Result};
use crate::shuffle;
use crate::types::{Direction, QueueSnapshot, RepeatMode};
use musify_core::Track;
use std::collections::HashSet;

/// Playback queue
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,

    /// `Some` exactly when `tracks` is non-empty
    current: Option<usize>,

    shuffle: bool,
    repeat: RepeatMode,

    /// Indices played in the current shuffle pass
    visited: HashSet<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue with initial flags
    pub fn with_modes(shuffle: bool, repeat: RepeatMode) -> Self {
        Self {
            shuffle,
            repeat,
            ..Self::default()
        }
    }

    /// Replace the queue and position it at `start_index`
    ///
    /// # Errors
    /// * `EmptyQueue` - `tracks` is empty
    /// * `IndexOutOfBounds` - `start_index >= tracks.len()`
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if start_index >= tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index: start_index,
                len: tracks.len(),
            });
        }

        self.tracks = tracks;
        self.current = Some(start_index);
        self.restart_pass();
        Ok(())
    }

    /// Append tracks to the end
    ///
    /// An empty queue becomes positioned at its first new track.
    pub fn append(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }

        self.tracks.extend(tracks);
        if self.current.is_none() {
            self.current = Some(0);
            self.restart_pass();
        }
    }

    /// Track at the current index
    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|index| self.tracks.get(index))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Move to the next or previous track
    ///
    /// Returns `None` and leaves the queue unchanged when there is no valid
    /// track in that direction.
    pub fn advance(&mut self, direction: Direction) -> Option<&Track> {
        let index = self.select_index(direction, &mut rand::thread_rng())?;
        self.current = Some(index);
        self.visited.insert(index);
        self.tracks.get(index)
    }

    fn select_index<R: rand::Rng + ?Sized>(
        &self,
        direction: Direction,
        rng: &mut R,
    ) -> Option<usize> {
        let current = self.current?;
        let len = self.tracks.len();

        if self.repeat == RepeatMode::One {
            return Some(current);
        }

        match direction {
            Direction::Next if self.shuffle && len > 1 => match self.repeat {
                RepeatMode::All => shuffle::pick_other(len, current, rng),
                _ => shuffle::pick_unvisited(len, &self.visited, rng),
            },
            Direction::Next => {
                if current + 1 < len {
                    Some(current + 1)
                } else if self.repeat == RepeatMode::All {
                    Some(0)
                } else {
                    None
                }
            }
            Direction::Previous => {
                if current > 0 {
                    Some(current - 1)
                } else if self.repeat == RepeatMode::All {
                    Some(len - 1)
                } else {
                    None
                }
            }
        }
    }

    /// Index of the first track with this id
    pub fn position_of(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == track_id)
    }

    /// Make `index` current
    pub fn jump_to(&mut self, index: usize) -> Result<&Track> {
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.tracks.len(),
            });
        }

        self.current = Some(index);
        self.visited.insert(index);
        Ok(&self.tracks[index])
    }

    /// Remove every track
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current = None;
        self.visited.clear();
    }

    /// Flip the shuffle flag, returning the new value
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.restart_pass();
        self.shuffle
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
        self.restart_pass();
    }

    /// Off -> All -> One -> Off, returning the new mode
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.set_repeat(self.repeat.cycle());
        self.repeat
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.tracks.clone(),
            current_index: self.current,
            shuffle: self.shuffle,
            repeat: self.repeat,
        }
    }

    fn restart_pass(&mut self) {
        self.visited.clear();
        if let Some(index) = self.current {
            self.visited.insert(index);
        }
    }
}
