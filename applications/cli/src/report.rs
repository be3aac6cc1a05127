/// Human-readable output for resolution attempts and player events
use musify_playback::PlaybackEvent;
use musify_source::{ResolutionAttempt, ResolutionOutcome};

/// One line per attempt, e.g. `#2 primary   timeout           4000 ms`
pub fn attempt_line(index: usize, attempt: &ResolutionAttempt) -> String {
    let outcome = match &attempt.outcome {
        ResolutionOutcome::Success(url) => format!("success {}", url),
        ResolutionOutcome::ServerError(reason) => format!("server error ({})", reason),
        ResolutionOutcome::Timeout => "timeout".to_string(),
    };

    format!(
        "#{:<2} {:<9} {:<40} {:>6} ms",
        index + 1,
        attempt.provider.to_string(),
        outcome,
        attempt.latency.as_millis()
    )
}

/// Whether an event is worth printing; position updates are too chatty
pub fn is_notable(event: &PlaybackEvent) -> bool {
    !matches!(event, PlaybackEvent::PositionUpdate { .. })
}
