/// Transport that only logs what a real audio sink would do
use musify_core::Track;
use musify_playback::PlaybackTransport;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTransport;

impl PlaybackTransport for LoggingTransport {
    fn load(&self, track: &Track, url: &str, start: Duration) {
        info!(
            track_id = %track.id,
            track = %track.label(),
            url = %url,
            start_ms = start.as_millis() as u64,
            "Transport: load"
        );
    }

    fn pause(&self) {
        info!("Transport: pause");
    }

    fn resume(&self) {
        info!("Transport: resume");
    }

    fn seek(&self, position: Duration) {
        info!(position_ms = position.as_millis() as u64, "Transport: seek");
    }

    fn stop(&self) {
        info!("Transport: stop");
    }
}
