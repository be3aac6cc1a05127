//! Source resolver
//!
//! Resolves a track to a playable URL against one provider at a time:
//!
//! 1. A well-formed `direct_source_url` on the track wins, no network call.
//! 2. Otherwise the provider's endpoint is called with a per-attempt timeout.
//! 3. Each call is classified as success, server error or timeout.
//! 4. Failures are retried with exponential backoff until retries run out.
//!
//! Each provider sits behind its own circuit breaker. Once a provider gave
//! up several resolutions in a row it is skipped without any call until the
//! cooldown passes.

use crate::breaker::{BreakerState, CircuitBreaker};
use crate::endpoint::SourceEndpoint;
use crate::error::{EndpointError, ResolveError};
use crate::retry::RetryPolicy;
use crate::types::{
    is_playable_url, Provider, Resolution, ResolutionAttempt, ResolutionOutcome, ResolverConfig,
};
use musify_core::{CoreError, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Resolves tracks to playable URLs
///
/// Cheap to share behind an `Arc`. The only state kept between requests is
/// each provider's circuit breaker.
pub struct SourceResolver {
    primary: Option<Upstream>,
    secondary: Option<Upstream>,
    timeout: Duration,
    retry: RetryPolicy,
    breaker_threshold: u32,
    breaker_cooldown: Duration,
}

/// A provider's endpoint and its breaker
struct Upstream {
    endpoint: Arc<dyn SourceEndpoint>,
    breaker: CircuitBreaker,
}

impl SourceResolver {
    /// Create a resolver with no endpoints configured.
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            primary: None,
            secondary: None,
            timeout: config.timeout(),
            retry: config.retry_policy(),
            breaker_threshold: config.breaker_threshold,
            breaker_cooldown: config.breaker_cooldown(),
        }
    }

    pub fn with_primary(mut self, endpoint: Arc<dyn SourceEndpoint>) -> Self {
        self.primary = Some(self.upstream(Provider::Primary, endpoint));
        self
    }

    pub fn with_secondary(mut self, endpoint: Arc<dyn SourceEndpoint>) -> Self {
        self.secondary = Some(self.upstream(Provider::Secondary, endpoint));
        self
    }

    fn upstream(&self, provider: Provider, endpoint: Arc<dyn SourceEndpoint>) -> Upstream {
        Upstream {
            breaker: CircuitBreaker::new(
                provider.to_string(),
                self.breaker_threshold,
                self.breaker_cooldown,
            ),
            endpoint,
        }
    }

    /// Check whether an endpoint is configured for a provider
    pub fn has_provider(&self, provider: Provider) -> bool {
        self.upstream_for(provider).is_some()
    }

    /// Circuit position for a provider, `None` when it isn't configured
    pub fn breaker_state(&self, provider: Provider) -> Option<BreakerState> {
        self.upstream_for(provider)
            .map(|upstream| upstream.breaker.state())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn upstream_for(&self, provider: Provider) -> Option<&Upstream> {
        match provider {
            Provider::Primary => self.primary.as_ref(),
            Provider::Secondary => self.secondary.as_ref(),
        }
    }

    /// Resolve a track to a playable URL
    ///
    /// # Errors
    /// * `InvalidRequest` - Track lacks id, name or artist. No call is made.
    /// * `SourceUnavailable` - Provider not configured, or every attempt failed.
    /// * `CircuitOpen` - Provider failed too often recently. No call is made.
    pub async fn resolve(
        &self,
        track: &Track,
        provider: Provider,
    ) -> Result<Resolution, ResolveError> {
        track.validate().map_err(|e| match e {
            CoreError::InvalidTrack(reason) => ResolveError::InvalidRequest(reason),
            other => ResolveError::InvalidRequest(other.to_string()),
        })?;

        if let Some(url) = track.direct_source_url.as_deref() {
            if is_playable_url(url) {
                debug!(track_id = %track.id, url = %url, "Using direct source URL");
                return Ok(Resolution {
                    url: url.trim().to_string(),
                    provider,
                    attempts: Vec::new(),
                    elapsed: Duration::ZERO,
                    direct: true,
                });
            }
            debug!(track_id = %track.id, url = %url, "Ignoring malformed direct source URL");
        }

        let Some(upstream) = self.upstream_for(provider) else {
            debug!(track_id = %track.id, provider = %provider, "No endpoint configured");
            return Err(ResolveError::SourceUnavailable {
                provider,
                attempts: Vec::new(),
            });
        };

        if !upstream.breaker.allow() {
            debug!(
                track_id = %track.id,
                provider = %provider,
                remaining_ms = ?upstream.breaker.remaining_cooldown().map(|d| d.as_millis() as u64),
                "Circuit open, skipping provider"
            );
            return Err(ResolveError::CircuitOpen { provider });
        }

        let result = self.call(upstream.endpoint.as_ref(), track, provider).await;
        match &result {
            Ok(_) => upstream.breaker.record_success(),
            Err(_) => upstream.breaker.record_failure(),
        }
        result
    }

    /// Attempts with backoff against one endpoint
    async fn call(
        &self,
        endpoint: &dyn SourceEndpoint,
        track: &Track,
        provider: Provider,
    ) -> Result<Resolution, ResolveError> {
        let started = Instant::now();
        let max_attempts = self.retry.max_attempts();
        let mut attempts = Vec::with_capacity(max_attempts as usize);

        for attempt in 0..max_attempts {
            if attempt > 0 {
                let delay = self.retry.backoff(attempt - 1);
                debug!(
                    track_id = %track.id,
                    provider = %provider,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }

            let call_started = Instant::now();
            let outcome = self.attempt(endpoint, track).await;
            let latency = call_started.elapsed();

            debug!(
                track_id = %track.id,
                endpoint = %endpoint.name(),
                attempt = attempt + 1,
                latency_ms = latency.as_millis() as u64,
                outcome = ?outcome,
                "Source attempt finished"
            );

            attempts.push(ResolutionAttempt {
                provider,
                outcome: outcome.clone(),
                latency,
            });

            match outcome {
                ResolutionOutcome::Success(url) => {
                    let elapsed = started.elapsed();
                    info!(
                        track_id = %track.id,
                        provider = %provider,
                        attempts = attempts.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Source resolved"
                    );
                    return Ok(Resolution {
                        url,
                        provider,
                        attempts,
                        elapsed,
                        direct: false,
                    });
                }
                ResolutionOutcome::ServerError(reason) => {
                    warn!(
                        track_id = %track.id,
                        provider = %provider,
                        attempt = attempt + 1,
                        max_attempts,
                        reason = %reason,
                        "Source attempt failed"
                    );
                }
                ResolutionOutcome::Timeout => {
                    warn!(
                        track_id = %track.id,
                        provider = %provider,
                        attempt = attempt + 1,
                        max_attempts,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Source attempt timed out"
                    );
                }
            }
        }

        warn!(
            track_id = %track.id,
            provider = %provider,
            attempts = attempts.len(),
            "Source unavailable"
        );
        Err(ResolveError::SourceUnavailable { provider, attempts })
    }

    /// One bounded call, classified
    async fn attempt(&self, endpoint: &dyn SourceEndpoint, track: &Track) -> ResolutionOutcome {
        match tokio::time::timeout(self.timeout, endpoint.fetch(track)).await {
            Err(_elapsed) => ResolutionOutcome::Timeout,
            Ok(Err(EndpointError::Timeout)) => ResolutionOutcome::Timeout,
            Ok(Err(e)) => ResolutionOutcome::ServerError(e.to_string()),
            Ok(Ok(body)) => {
                let body = body.trim();
                if is_playable_url(body) {
                    ResolutionOutcome::Success(body.to_string())
                } else {
                    ResolutionOutcome::ServerError(
                        EndpointError::MalformedBody(truncate(body, 80)).to_string(),
                    )
                }
            }
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{FlakyEndpoint, ScriptStep, ScriptedEndpoint};

    fn config() -> ResolverConfig {
        ResolverConfig {
            timeout_ms: 4000,
            max_retries: 2,
            backoff_base_ms: 250,
            backoff_max_ms: 2000,
            jitter: true,
            breaker_threshold: 0,
            breaker_cooldown_ms: 30_000,
        }
    }

    fn track() -> Track {
        Track::new("T1", "Song", "Artist")
    }

    fn resolver_with(endpoint: Arc<ScriptedEndpoint>) -> SourceResolver {
        SourceResolver::new(&config()).with_primary(endpoint)
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_timeout_success_returns_url() {
        let endpoint = Arc::new(ScriptedEndpoint::new([
            ScriptStep::Hang,
            ScriptStep::Hang,
            ScriptStep::respond("https://cdn.example/high-bitrate/X"),
        ]));
        let resolver = resolver_with(endpoint.clone());

        let resolution = resolver.resolve(&track(), Provider::Primary).await.unwrap();

        assert_eq!(resolution.url, "https://cdn.example/high-bitrate/X");
        assert_eq!(resolution.provider, Provider::Primary);
        assert!(!resolution.direct);
        assert_eq!(endpoint.calls(), 3);

        let outcomes: Vec<_> = resolution.attempts.iter().map(|a| &a.outcome).collect();
        assert_eq!(outcomes[0], &ResolutionOutcome::Timeout);
        assert_eq!(outcomes[1], &ResolutionOutcome::Timeout);
        assert!(outcomes[2].is_success());
        assert_eq!(resolution.attempts[0].latency, Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn always_hanging_upstream_is_bounded() {
        let endpoint = Arc::new(ScriptedEndpoint::always(ScriptStep::Hang));
        let resolver = resolver_with(endpoint.clone());
        let started = Instant::now();

        let err = resolver.resolve(&track(), Provider::Primary).await.unwrap_err();

        let elapsed = started.elapsed();
        assert!(
            elapsed <= config().worst_case() + Duration::from_millis(10),
            "took {:?}",
            elapsed
        );
        assert!(elapsed >= Duration::from_secs(12));
        assert!(matches!(
            err,
            ResolveError::SourceUnavailable { provider: Provider::Primary, .. }
        ));
        assert_eq!(err.attempts().len(), 3);
        assert_eq!(endpoint.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_and_garbage_are_retried() {
        let endpoint = Arc::new(ScriptedEndpoint::new([
            ScriptStep::Fail(500),
            ScriptStep::respond("Upstream error"),
            ScriptStep::respond("https://cdn.example/high-bitrate/T1\n"),
        ]));
        let resolver = resolver_with(endpoint);

        let resolution = resolver.resolve(&track(), Provider::Primary).await.unwrap();

        assert_eq!(resolution.url, "https://cdn.example/high-bitrate/T1");
        assert!(matches!(
            resolution.attempts[0].outcome,
            ResolutionOutcome::ServerError(_)
        ));
        assert!(matches!(
            resolution.attempts[1].outcome,
            ResolutionOutcome::ServerError(ref reason) if reason.contains("Malformed")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_answer_past_timeout_counts_as_timeout() {
        let endpoint = Arc::new(ScriptedEndpoint::new([
            ScriptStep::RespondAfter(Duration::from_secs(5), "https://late.example/a".into()),
            ScriptStep::RespondAfter(Duration::from_secs(1), "https://ok.example/a".into()),
        ]));
        let resolver = resolver_with(endpoint);

        let resolution = resolver.resolve(&track(), Provider::Primary).await.unwrap();

        assert_eq!(resolution.url, "https://ok.example/a");
        assert_eq!(resolution.attempts[0].outcome, ResolutionOutcome::Timeout);
        assert_eq!(resolution.attempts[1].latency, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn direct_source_url_skips_network() {
        let endpoint = Arc::new(ScriptedEndpoint::always(ScriptStep::Hang));
        let resolver = resolver_with(endpoint.clone());
        let track = track().with_direct_source_url("https://cdn.example/preview/T1.mp3");

        let resolution = resolver.resolve(&track, Provider::Primary).await.unwrap();

        assert_eq!(resolution.url, "https://cdn.example/preview/T1.mp3");
        assert!(resolution.direct);
        assert!(resolution.attempts.is_empty());
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_direct_url_falls_through() {
        let endpoint = Arc::new(ScriptedEndpoint::new([ScriptStep::respond(
            "https://cdn.example/high-bitrate/T1",
        )]));
        let resolver = resolver_with(endpoint.clone());
        let track = track().with_direct_source_url("spotify:track:T1");

        let resolution = resolver.resolve(&track, Provider::Primary).await.unwrap();

        assert!(!resolution.direct);
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_track_is_rejected_without_calls() {
        let endpoint = Arc::new(ScriptedEndpoint::always(ScriptStep::Hang));
        let resolver = resolver_with(endpoint.clone());

        let err = resolver
            .resolve(&Track::new("T1", "", "Artist"), Provider::Primary)
            .await
            .unwrap_err();

        assert!(err.is_invalid_request());
        assert!(err.attempts().is_empty());
        assert_eq!(endpoint.calls(), 0);
    }

    #[tokio::test]
    async fn unconfigured_provider_is_unavailable() {
        let resolver = SourceResolver::new(&config());
        assert!(!resolver.has_provider(Provider::Secondary));

        let err = resolver.resolve(&track(), Provider::Secondary).await.unwrap_err();

        assert!(matches!(
            err,
            ResolveError::SourceUnavailable { provider: Provider::Secondary, ref attempts }
                if attempts.is_empty()
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn secondary_provider_uses_its_own_endpoint() {
        let primary = Arc::new(ScriptedEndpoint::always(ScriptStep::Hang));
        let secondary = Arc::new(ScriptedEndpoint::new([ScriptStep::respond(
            "https://cdn.example/low-bitrate/T1",
        )]));
        let resolver = SourceResolver::new(&config())
            .with_primary(primary.clone())
            .with_secondary(secondary.clone());

        let resolution = resolver.resolve(&track(), Provider::Secondary).await.unwrap();

        assert_eq!(resolution.provider, Provider::Secondary);
        assert_eq!(primary.calls(), 0);
        assert_eq!(secondary.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn flaky_upstream_mostly_resolves() {
        let resolver =
            SourceResolver::new(&config()).with_primary(Arc::new(FlakyEndpoint::with_seed(42)));

        let runs = 300;
        let mut resolved = 0;
        for i in 0..runs {
            let track = Track::new(format!("T{}", i), "Song", "Artist");
            if let Ok(resolution) = resolver.resolve(&track, Provider::Primary).await {
                assert_eq!(
                    resolution.url,
                    format!("https://cdn.example/high-bitrate/T{}", i)
                );
                resolved += 1;
            }
        }

        // 1 - 0.6^3 = 0.784 expected with two retries
        let ratio = resolved as f64 / runs as f64;
        assert!(ratio > 0.65, "resolved ratio {}", ratio);
    }

    #[tokio::test(start_paused = true)]
    async fn open_circuit_stops_calling_until_cooldown() {
        let endpoint = Arc::new(ScriptedEndpoint::new([
            ScriptStep::Hang,
            ScriptStep::Fail(500),
            ScriptStep::respond("https://cdn.example/high-bitrate/T1"),
        ]));
        let resolver = SourceResolver::new(&ResolverConfig {
            max_retries: 0,
            breaker_threshold: 2,
            breaker_cooldown_ms: 10_000,
            ..config()
        })
        .with_primary(endpoint.clone());

        assert!(resolver.resolve(&track(), Provider::Primary).await.is_err());
        assert!(resolver.resolve(&track(), Provider::Primary).await.is_err());
        assert_eq!(endpoint.calls(), 2);
        assert_eq!(
            resolver.breaker_state(Provider::Primary),
            Some(BreakerState::Open)
        );

        for _ in 0..5 {
            let err = resolver.resolve(&track(), Provider::Primary).await.unwrap_err();
            assert!(matches!(
                err,
                ResolveError::CircuitOpen { provider: Provider::Primary }
            ));
            assert!(err.attempts().is_empty());
        }
        assert_eq!(endpoint.calls(), 2);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(
            resolver.breaker_state(Provider::Primary),
            Some(BreakerState::HalfOpen)
        );

        let resolution = resolver.resolve(&track(), Provider::Primary).await.unwrap();
        assert_eq!(resolution.url, "https://cdn.example/high-bitrate/T1");
        assert_eq!(endpoint.calls(), 3);
        assert_eq!(
            resolver.breaker_state(Provider::Primary),
            Some(BreakerState::Closed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn circuits_are_per_provider() {
        let primary = Arc::new(ScriptedEndpoint::always(ScriptStep::Fail(500)));
        let secondary = Arc::new(ScriptedEndpoint::always(ScriptStep::respond(
            "https://cdn.example/low-bitrate/T1",
        )));
        let resolver = SourceResolver::new(&ResolverConfig {
            max_retries: 0,
            breaker_threshold: 1,
            ..config()
        })
        .with_primary(primary)
        .with_secondary(secondary.clone());

        assert!(resolver.resolve(&track(), Provider::Primary).await.is_err());
        assert_eq!(
            resolver.breaker_state(Provider::Primary),
            Some(BreakerState::Open)
        );

        assert!(resolver.resolve(&track(), Provider::Secondary).await.is_ok());
        assert_eq!(
            resolver.breaker_state(Provider::Secondary),
            Some(BreakerState::Closed)
        );
        assert_eq!(secondary.calls(), 1);
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate("short", 80), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
