//! Position tracking
//!
//! Follows progress for the track that is currently loaded, ignores signals
//! for any other track and reports completion exactly once per load.

use std::time::Duration;

/// Progress report from the playback medium
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTick {
    /// Track the medium is playing
    pub track_id: String,

    /// Elapsed time
    pub position: Duration,

    /// Total duration, once the medium knows it
    pub duration: Option<Duration>,
}

impl ProgressTick {
    pub fn new(track_id: impl Into<String>, position: Duration, duration: Option<Duration>) -> Self {
        Self {
            track_id: track_id.into(),
            position,
            duration,
        }
    }

    /// Build a tick from media-element style floating seconds
    ///
    /// Negative or non-finite positions read as zero. Negative, zero or
    /// non-finite durations (a live stream reports infinity) read as unknown.
    pub fn from_secs_f64(track_id: impl Into<String>, position: f64, duration: f64) -> Self {
        let duration = Duration::try_from_secs_f64(duration)
            .ok()
            .filter(|d| !d.is_zero());

        Self {
            track_id: track_id.into(),
            position: Duration::try_from_secs_f64(position).unwrap_or_default(),
            duration,
        }
    }
}

/// What a signal did to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Signal was for another track, or nothing is loaded
    Stale,

    /// Position or duration updated
    Updated,

    /// Track reached its end; fires once per load
    Completed,

    /// Track had already completed
    AlreadyCompleted,
}

/// Tracks elapsed time and duration of the loaded track
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    track_id: Option<String>,
    position: Duration,
    duration: Option<Duration>,
    completed: bool,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking a freshly loaded track
    pub fn start(&mut self, track_id: impl Into<String>, duration_hint: Option<Duration>) {
        self.track_id = Some(track_id.into());
        self.position = Duration::ZERO;
        self.duration = duration_hint.filter(|d| !d.is_zero());
        self.completed = false;
    }

    /// Stop tracking; every signal is stale until the next `start`
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a progress report
    pub fn on_tick(&mut self, tick: &ProgressTick) -> TickOutcome {
        if !self.is_current(&tick.track_id) {
            return TickOutcome::Stale;
        }
        if self.completed {
            return TickOutcome::AlreadyCompleted;
        }

        if let Some(duration) = tick.duration.filter(|d| !d.is_zero()) {
            self.duration = Some(duration);
        }
        self.position = tick.position;

        self.check_completion()
    }

    /// Advance by wall-clock time when the medium reports nothing itself
    pub fn advance(&mut self, elapsed: Duration) -> TickOutcome {
        let Some(track_id) = self.track_id.clone() else {
            return TickOutcome::Stale;
        };

        let tick = ProgressTick {
            track_id,
            position: self.position.saturating_add(elapsed),
            duration: None,
        };
        self.on_tick(&tick)
    }

    /// The medium says the track ended
    pub fn on_ended(&mut self, track_id: &str) -> TickOutcome {
        if !self.is_current(track_id) {
            return TickOutcome::Stale;
        }
        if self.completed {
            return TickOutcome::AlreadyCompleted;
        }

        self.completed = true;
        if let Some(duration) = self.duration {
            self.position = duration;
        }
        TickOutcome::Completed
    }

    /// Move the position, clamped to the duration when known
    pub fn seek(&mut self, position: Duration) -> Duration {
        self.position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.position
    }

    pub fn is_current(&self, track_id: &str) -> bool {
        self.track_id.as_deref() == Some(track_id)
    }

    pub fn track_id(&self) -> Option<&str> {
        self.track_id.as_deref()
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    fn check_completion(&mut self) -> TickOutcome {
        match self.duration {
            Some(duration) if self.position >= duration => {
                self.completed = true;
                self.position = duration;
                TickOutcome::Completed
            }
            _ => TickOutcome::Updated,
        }
    }
}
