//! Player - playback orchestration
//!
//! Coordinates source resolution, queue, position tracking and history into
//! a single state machine:
//!
//! ```text
//! stopped -> loading -> playing <-> paused
//!               |          |
//!               v          v
//!             error      loading (next / previous / track end)
//! ```
//!
//! Any state goes to `stopped` on `stop`. `error` is left through `retry` or
//! any command that loads another track.
//!
//! Every load bumps a generation counter. A resolution that completes after
//! its generation was superseded, or after the current track changed, is
//! dropped without touching state (last command wins).

use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::history::History;
use crate::position::{PositionTracker, ProgressTick, TickOutcome};
use crate::queue::Queue;
use crate::transport::{PlaybackTransport, TransportSignal};
use crate::types::{
    Direction, ErrorKind, PlaybackConfig, PlaybackState, PlaybackStatus, QueueSnapshot,
    RepeatMode,
};
use musify_core::{CoreError, Track};
use musify_source::{Provider, Resolution, ResolveError, SourceResolver};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 256;

/// Playback state machine
///
/// Cheap to clone; all clones drive the same player. State lives behind a
/// mutex that is never held across an `.await`, so commands can be issued
/// concurrently from any task.
///
/// # Example
///
/// ```ignore
/// let player = Player::new(resolver, Arc::new(NullTransport), PlaybackConfig::default());
/// let mut states = player.subscribe();
///
/// player.play_queue(tracks, 0).await?;
/// player.pause();
/// player.resume();
/// player.next().await;
/// ```
#[derive(Clone)]
pub struct Player {
    inner: Arc<Inner>,
}

struct Inner {
    core: Mutex<PlayerCore>,
    resolver: Arc<SourceResolver>,
    transport: Arc<dyn PlaybackTransport>,
    config: PlaybackConfig,
    state_tx: watch::Sender<PlaybackState>,
    event_tx: broadcast::Sender<PlaybackEvent>,

    /// Identifies the live wall-clock driver; older drivers exit
    driver_epoch: AtomicU64,
}

struct PlayerCore {
    state: PlaybackState,
    queue: Queue,
    tracker: PositionTracker,
    history: History,

    /// Bumped by every command that supersedes a pending load
    generation: u64,

    /// Queue points at a track that was enqueued but never started
    cued: bool,
}

impl PlayerCore {
    fn is_current(&self, generation: u64, track_id: &str) -> bool {
        self.generation == generation && self.state.current_track_id() == Some(track_id)
    }

    /// Track a navigation command should load: the cued track when nothing
    /// was started yet, otherwise the queue's neighbour in `direction`
    fn navigate(&mut self, direction: Direction) -> Option<Track> {
        if self.cued {
            return self.queue.current().cloned();
        }
        self.queue.advance(direction).cloned()
    }
}

/// Load set up under the lock, finished by `Player::complete`
enum Load {
    /// Replayed from the cached URL; nothing left to resolve
    Done(PlaybackState),

    Resolve {
        track: Track,
        generation: u64,
        requested_at: Instant,
    },
}

impl Player {
    /// Create a new player
    pub fn new(
        resolver: Arc<SourceResolver>,
        transport: Arc<dyn PlaybackTransport>,
        config: PlaybackConfig,
    ) -> Self {
        let core = PlayerCore {
            state: PlaybackState::default(),
            queue: Queue::with_modes(config.shuffle, config.repeat),
            tracker: PositionTracker::new(),
            history: History::new(config.history_size),
            generation: 0,
            cued: false,
        };
        let (state_tx, _) = watch::channel(PlaybackState::default());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                core: Mutex::new(core),
                resolver,
                transport,
                config,
                state_tx,
                event_tx,
                driver_epoch: AtomicU64::new(0),
            }),
        }
    }

    // ===== Playback Control =====

    /// Play a track
    ///
    /// The track becomes current in the queue: jumped to when already
    /// queued, appended otherwise. Resolves once the load finished, failed
    /// or was superseded, returning the state at that point.
    ///
    /// # Errors
    /// * `InvalidRequest` - Track lacks id, name or artist. State is unchanged.
    pub async fn play(&self, track: Track) -> Result<PlaybackState> {
        validate(&track)?;

        let load = {
            let mut core = self.inner.lock();
            let index = match core.queue.position_of(&track.id) {
                Some(index) => index,
                None => {
                    core.queue.append(vec![track.clone()]);
                    let length = core.queue.len();
                    self.inner.emit(PlaybackEvent::QueueChanged { length });
                    length - 1
                }
            };
            core.queue.jump_to(index)?;
            self.inner.prepare(&mut core, track)
        };

        Ok(self.complete(load).await)
    }

    /// Replace the queue and play from `start_index`
    ///
    /// # Errors
    /// * `EmptyQueue` - `tracks` is empty
    /// * `IndexOutOfBounds` - `start_index` past the end
    /// * `InvalidRequest` - Start track lacks id, name or artist
    pub async fn play_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<PlaybackState> {
        if let Some(track) = tracks.get(start_index) {
            validate(track)?;
        }

        let load = {
            let mut core = self.inner.lock();
            core.queue.set_queue(tracks, start_index)?;
            let length = core.queue.len();
            self.inner.emit(PlaybackEvent::QueueChanged { length });
            match core.queue.current().cloned() {
                Some(track) => self.inner.prepare(&mut core, track),
                None => return Err(PlaybackError::EmptyQueue),
            }
        };

        Ok(self.complete(load).await)
    }

    /// Append tracks without interrupting playback, returning the new length
    ///
    /// Enqueueing into an empty queue cues its first track: the next
    /// `next`, `previous` or `on_track_end` starts it.
    pub fn enqueue(&self, tracks: Vec<Track>) -> usize {
        let mut core = self.inner.lock();
        if core.queue.is_empty() && !tracks.is_empty() {
            core.cued = true;
        }
        core.queue.append(tracks);
        let length = core.queue.len();
        self.inner.emit(PlaybackEvent::QueueChanged { length });
        length
    }

    /// Pause playback. No-op unless playing.
    pub fn pause(&self) -> PlaybackState {
        let mut core = self.inner.lock();
        if core.state.status == PlaybackStatus::Playing {
            self.inner.transport.pause();
            self.inner.set_status(&mut core, PlaybackStatus::Paused);
            self.inner.publish(&core);
        } else {
            debug!(status = ?core.state.status, "Ignoring pause");
        }
        core.state.clone()
    }

    /// Resume playback. No-op unless paused.
    pub fn resume(&self) -> PlaybackState {
        let mut core = self.inner.lock();
        if core.state.status == PlaybackStatus::Paused {
            self.inner.transport.resume();
            self.inner.set_status(&mut core, PlaybackStatus::Playing);
            self.inner.publish(&core);
        } else {
            debug!(status = ?core.state.status, "Ignoring resume");
        }
        core.state.clone()
    }

    /// Skip to the next track
    ///
    /// When the queue has no next track the state is left untouched.
    pub async fn next(&self) -> PlaybackState {
        self.step(Direction::Next).await
    }

    /// Go back to the previous queue entry
    ///
    /// When the queue has no previous track the state is left untouched.
    pub async fn previous(&self) -> PlaybackState {
        self.step(Direction::Previous).await
    }

    /// Natural end of the current track (autoplay)
    ///
    /// Like `next`, except that running off the end of the queue stops
    /// playback.
    pub async fn on_track_end(&self) -> PlaybackState {
        self.auto_advance(None).await
    }

    /// Stop playback and reset state. The queue is kept.
    pub fn stop(&self) -> PlaybackState {
        let mut core = self.inner.lock();
        self.inner.reset(&mut core);
        core.state.clone()
    }

    /// Reload the current track after an error. No-op in any other state.
    pub async fn retry(&self) -> PlaybackState {
        let load = {
            let mut core = self.inner.lock();
            match (core.state.status, core.state.current_track.clone()) {
                (PlaybackStatus::Error, Some(track)) => {
                    info!(track_id = %track.id, "Retrying playback");
                    self.inner.prepare(&mut core, track)
                }
                _ => {
                    debug!(status = ?core.state.status, "Nothing to retry");
                    return core.state.clone();
                }
            }
        };

        self.complete(load).await
    }

    /// Reset everything: stop, empty the queue and history, end the
    /// wall-clock driver
    pub fn teardown(&self) {
        self.inner.driver_epoch.fetch_add(1, Ordering::SeqCst);

        let mut core = self.inner.lock();
        self.inner.reset(&mut core);
        core.queue.clear();
        core.cued = false;
        core.history.clear();
        self.inner.emit(PlaybackEvent::QueueChanged { length: 0 });
        info!("Player torn down");
    }

    // ===== Seek =====

    /// Move the playback position. Valid while playing or paused.
    pub fn seek(&self, position: Duration) -> PlaybackState {
        let mut core = self.inner.lock();
        if !core.state.status.is_active() {
            debug!(status = ?core.state.status, "Ignoring seek");
            return core.state.clone();
        }

        let position = core.tracker.seek(position);
        core.state.position = position;
        self.inner.transport.seek(position);
        self.inner.emit_position(&core);
        self.inner.publish(&core);
        core.state.clone()
    }

    // ===== Shuffle & Repeat =====

    /// Flip shuffle, returning the new value
    pub fn toggle_shuffle(&self) -> bool {
        let enabled = self.inner.lock().queue.toggle_shuffle();
        debug!(enabled, "Shuffle toggled");
        enabled
    }

    pub fn set_repeat(&self, mode: RepeatMode) {
        self.inner.lock().queue.set_repeat(mode);
        debug!(mode = ?mode, "Repeat mode set");
    }

    /// Off -> All -> One -> Off, returning the new mode
    pub fn cycle_repeat(&self) -> RepeatMode {
        let mode = self.inner.lock().queue.cycle_repeat();
        debug!(mode = ?mode, "Repeat mode cycled");
        mode
    }

    // ===== Transport Feedback =====

    /// Feed a transport signal into the player
    pub async fn handle_signal(&self, signal: TransportSignal) -> PlaybackState {
        match signal {
            TransportSignal::Progress(tick) => self.on_progress(tick).await,
            TransportSignal::Ended { track_id } => {
                let completed = {
                    let mut core = self.inner.lock();
                    let outcome = core.tracker.on_ended(&track_id);
                    let generation = core.generation;
                    self.inner.apply_tick(&mut core, outcome).then_some(generation)
                };
                self.finish(completed).await
            }
            TransportSignal::Error { track_id, message } => self.on_media_error(&track_id, &message),
        }
    }

    /// Apply a progress report; advances the queue when the track completes
    pub async fn on_progress(&self, tick: ProgressTick) -> PlaybackState {
        let completed = {
            let mut core = self.inner.lock();
            let outcome = core.tracker.on_tick(&tick);
            let generation = core.generation;
            self.inner.apply_tick(&mut core, outcome).then_some(generation)
        };
        self.finish(completed).await
    }

    fn on_media_error(&self, track_id: &str, message: &str) -> PlaybackState {
        let mut core = self.inner.lock();
        if !core.tracker.is_current(track_id) || !core.state.status.is_active() {
            debug!(track_id = %track_id, "Ignoring media error for stale track");
            return core.state.clone();
        }

        core.generation += 1;
        core.tracker.reset();
        self.inner.transport.stop();
        self.inner.fail(&mut core, ErrorKind::MediaError, message.to_string());
        self.inner.publish(&core);
        core.state.clone()
    }

    /// Spawn a task that advances the position by wall-clock time while
    /// playing
    ///
    /// For transports that don't report progress. Spawning a new driver
    /// retires the previous one; `teardown` retires it too. Dropping every
    /// `Player` handle also ends it.
    pub fn spawn_wall_clock(&self) -> JoinHandle<()> {
        let epoch = self.inner.driver_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.config.wall_clock_period();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();

            loop {
                interval.tick().await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if inner.driver_epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }

                let elapsed = Instant::now().saturating_duration_since(last);
                Player { inner }.wall_clock_tick(elapsed).await;

                // Time spent loading the next track doesn't count as progress
                last = Instant::now();
            }

            debug!("Wall-clock driver stopped");
        })
    }

    async fn wall_clock_tick(&self, elapsed: Duration) {
        let completed = {
            let mut core = self.inner.lock();
            if core.state.status != PlaybackStatus::Playing {
                return;
            }
            let outcome = core.tracker.advance(elapsed);
            let generation = core.generation;
            self.inner.apply_tick(&mut core, outcome).then_some(generation)
        };
        self.finish(completed).await;
    }

    // ===== State Queries =====

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state.clone()
    }

    /// Latest-state stream
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state_tx.subscribe()
    }

    /// Event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.inner.lock().queue.snapshot()
    }

    /// Tracks that started playing this session, oldest first
    pub fn history(&self) -> Vec<Track> {
        self.inner.lock().history.tracks()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.inner.config
    }

    // ===== Loading =====

    async fn step(&self, direction: Direction) -> PlaybackState {
        let load = {
            let mut core = self.inner.lock();
            match core.navigate(direction) {
                Some(track) => self.inner.prepare(&mut core, track),
                None => {
                    debug!(direction = ?direction, "No track in that direction");
                    return core.state.clone();
                }
            }
        };

        self.complete(load).await
    }

    /// Completion detected by the tracker
    async fn finish(&self, completed_generation: Option<u64>) -> PlaybackState {
        match completed_generation {
            Some(generation) => self.auto_advance(Some(generation)).await,
            None => self.state(),
        }
    }

    /// Advance after a track ended; `expected_generation` guards against a
    /// command that already moved on
    async fn auto_advance(&self, expected_generation: Option<u64>) -> PlaybackState {
        let load = {
            let mut core = self.inner.lock();
            if expected_generation.is_some_and(|generation| generation != core.generation) {
                debug!("Track end superseded by a newer command");
                return core.state.clone();
            }

            match core.navigate(Direction::Next) {
                Some(track) => self.inner.prepare(&mut core, track),
                None => {
                    info!("End of queue");
                    core.generation += 1;
                    core.tracker.reset();
                    if core.state.status.is_active() {
                        self.inner.transport.stop();
                    }
                    core.state.position = Duration::ZERO;
                    core.state.error = None;
                    self.inner.set_status(&mut core, PlaybackStatus::Stopped);
                    self.inner.publish(&core);
                    return core.state.clone();
                }
            }
        };

        self.complete(load).await
    }

    /// Finish a prepared load: resolve the URL and hand it to the transport
    async fn complete(&self, load: Load) -> PlaybackState {
        let (track, generation, requested_at) = match load {
            Load::Done(state) => return state,
            Load::Resolve {
                track,
                generation,
                requested_at,
            } => (track, generation, requested_at),
        };

        let outcome = self.resolve_with_fallback(&track, generation).await;

        let mut core = self.inner.lock();
        if !core.is_current(generation, &track.id) {
            debug!(
                track_id = %track.id,
                kind = ?ErrorKind::StaleResult,
                "Discarding resolution for superseded request"
            );
            return core.state.clone();
        }

        match outcome {
            Ok(resolution) => {
                let time_to_play = requested_at.elapsed();
                core.state.resolved_audio_url = Some(resolution.url.clone());
                core.state.position = Duration::ZERO;
                let duration = core.state.duration;
                core.tracker.start(track.id.clone(), duration);
                self.inner
                    .transport
                    .load(&track, &resolution.url, Duration::ZERO);
                core.history.push(track.clone());

                info!(
                    track_id = %track.id,
                    provider = %resolution.provider,
                    attempts = resolution.attempts.len(),
                    direct = resolution.direct,
                    time_to_play_ms = time_to_play.as_millis() as u64,
                    "Playback started"
                );
                self.inner.emit(PlaybackEvent::SourceResolved {
                    track_id: track.id.clone(),
                    provider: resolution.provider,
                    attempts: resolution.attempts.len(),
                    direct: resolution.direct,
                    time_to_play_ms: time_to_play.as_millis() as u64,
                });
                self.inner.set_status(&mut core, PlaybackStatus::Playing);
            }
            Err(err) => {
                let kind = match err {
                    ResolveError::InvalidRequest(_) => ErrorKind::InvalidRequest,
                    ResolveError::SourceUnavailable { .. } | ResolveError::CircuitOpen { .. } => {
                        ErrorKind::SourceUnavailable
                    }
                };
                self.inner.fail(&mut core, kind, err.to_string());
            }
        }

        self.inner.publish(&core);
        core.state.clone()
    }

    /// Primary provider, then the secondary once if the primary gave up
    async fn resolve_with_fallback(
        &self,
        track: &Track,
        generation: u64,
    ) -> std::result::Result<Resolution, ResolveError> {
        let resolver = &self.inner.resolver;

        let primary_err = match resolver.resolve(track, Provider::Primary).await {
            Ok(resolution) => return Ok(resolution),
            Err(err) if err.is_invalid_request() => return Err(err),
            Err(err) => err,
        };

        let will_fall_back = self.inner.config.fallback_enabled
            && resolver.has_provider(Provider::Secondary)
            && self.inner.lock().is_current(generation, &track.id);

        self.inner.emit(PlaybackEvent::ResolutionFailed {
            track_id: track.id.clone(),
            provider: Provider::Primary,
            attempts: primary_err.attempts().len(),
            will_fall_back,
        });

        if !will_fall_back {
            return Err(primary_err);
        }

        warn!(
            track_id = %track.id,
            attempts = primary_err.attempts().len(),
            "Primary source unavailable, falling back to secondary"
        );

        let mut attempts = primary_err.attempts().to_vec();
        match resolver.resolve(track, Provider::Secondary).await {
            Ok(mut resolution) => {
                attempts.append(&mut resolution.attempts);
                resolution.attempts = attempts;
                Ok(resolution)
            }
            Err(secondary_err) => {
                self.inner.emit(PlaybackEvent::ResolutionFailed {
                    track_id: track.id.clone(),
                    provider: Provider::Secondary,
                    attempts: secondary_err.attempts().len(),
                    will_fall_back: false,
                });
                attempts.extend_from_slice(secondary_err.attempts());
                Err(ResolveError::SourceUnavailable {
                    provider: Provider::Secondary,
                    attempts,
                })
            }
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, PlayerCore> {
        self.core
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn publish(&self, core: &PlayerCore) {
        self.state_tx.send_replace(core.state.clone());
    }

    fn emit_position(&self, core: &PlayerCore) {
        self.emit(PlaybackEvent::PositionUpdate {
            position_ms: core.state.position.as_millis() as u64,
            duration_ms: core.state.duration.map(|d| d.as_millis() as u64),
        });
    }

    fn set_status(&self, core: &mut PlayerCore, status: PlaybackStatus) {
        if core.state.status == status {
            return;
        }

        info!(
            from = ?core.state.status,
            to = ?status,
            track_id = ?core.state.current_track_id(),
            "Playback status changed"
        );
        core.state.status = status;
        self.emit(PlaybackEvent::StateChanged { status });
    }

    fn fail(&self, core: &mut PlayerCore, kind: ErrorKind, message: String) {
        warn!(
            track_id = ?core.state.current_track_id(),
            kind = ?kind,
            message = %message,
            "Playback failed"
        );
        core.state.error = Some(kind);
        core.state.resolved_audio_url = None;
        core.state.position = Duration::ZERO;
        self.set_status(core, PlaybackStatus::Error);
        self.emit(PlaybackEvent::Error { kind, message });
    }

    /// Make `track` current and start loading it
    ///
    /// Runs in the same critical section as the queue move that picked
    /// `track`, so the generation it captures always matches the queue.
    fn prepare(&self, core: &mut PlayerCore, track: Track) -> Load {
        core.generation += 1;
        core.cued = false;

        if let Some(state) = self.replay(core, &track) {
            return Load::Done(state);
        }

        let previous_track_id = core.state.current_track_id().map(str::to_string);
        if core.state.status.is_active() {
            self.transport.stop();
        }
        core.tracker.reset();
        core.state = PlaybackState {
            status: core.state.status,
            current_track: Some(track.clone()),
            resolved_audio_url: None,
            position: Duration::ZERO,
            duration: track.duration(),
            error: None,
        };

        if previous_track_id.as_deref() != Some(track.id.as_str()) {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: track.id.clone(),
                previous_track_id,
            });
        }
        self.set_status(core, PlaybackStatus::Loading);
        self.publish(core);

        Load::Resolve {
            track,
            generation: core.generation,
            requested_at: Instant::now(),
        }
    }

    /// Back to the initial state, cancelling any pending load
    fn reset(&self, core: &mut PlayerCore) {
        core.generation += 1;
        if core.state.status.is_active() {
            self.transport.stop();
        }
        core.tracker.reset();
        self.set_status(core, PlaybackStatus::Stopped);
        core.state = PlaybackState::default();
        self.publish(core);
    }

    /// Restart the current track from its already resolved URL
    fn replay(&self, core: &mut PlayerCore, track: &Track) -> Option<PlaybackState> {
        if core.state.current_track_id() != Some(track.id.as_str())
            || core.state.status == PlaybackStatus::Loading
        {
            return None;
        }
        let url = core.state.resolved_audio_url.clone()?;

        debug!(track_id = %track.id, "Replaying with cached source URL");
        core.state.position = Duration::ZERO;
        core.state.error = None;
        let duration = core.state.duration;
        core.tracker.start(track.id.clone(), duration);
        self.transport.load(track, &url, Duration::ZERO);
        core.history.push(track.clone());

        self.emit_position(core);
        self.set_status(core, PlaybackStatus::Playing);
        self.publish(core);
        Some(core.state.clone())
    }

    /// Reflect a tracker outcome in state; true when the track completed
    fn apply_tick(&self, core: &mut PlayerCore, outcome: TickOutcome) -> bool {
        match outcome {
            TickOutcome::Stale => {
                debug!("Ignoring progress for stale track");
                false
            }
            TickOutcome::AlreadyCompleted => false,
            TickOutcome::Updated => {
                core.state.position = core.tracker.position();
                core.state.duration = core.tracker.duration();
                self.emit_position(core);
                self.publish(core);
                false
            }
            TickOutcome::Completed => {
                core.state.position = core.tracker.position();
                core.state.duration = core.tracker.duration();
                self.emit_position(core);
                if let Some(track_id) = core.tracker.track_id() {
                    debug!(track_id = %track_id, "Track finished");
                    self.emit(PlaybackEvent::TrackFinished {
                        track_id: track_id.to_string(),
                    });
                }
                self.publish(core);
                true
            }
        }
    }
}

fn validate(track: &Track) -> Result<()> {
    track.validate().map_err(|e| match e {
        CoreError::InvalidTrack(reason) => PlaybackError::InvalidRequest(reason),
        other => PlaybackError::InvalidRequest(other.to_string()),
    })
}
