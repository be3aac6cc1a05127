//! Core types for source resolution

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Schemes accepted as directly playable
const PLAYABLE_SCHEMES: &[&str] = &["http", "https"];

/// Check that a string is a well-formed URL with a playable scheme
pub fn is_playable_url(candidate: &str) -> bool {
    url::Url::parse(candidate.trim())
        .map(|url| PLAYABLE_SCHEMES.contains(&url.scheme()) && url.has_host())
        .unwrap_or(false)
}

/// Which upstream to ask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Main stream source (keyed by track id)
    Primary,

    /// Alternate source tried once after the primary gives up
    Secondary,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Primary => f.write_str("primary"),
            Provider::Secondary => f.write_str("secondary"),
        }
    }
}

/// Classified result of one endpoint call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Endpoint returned a playable URL
    Success(String),

    /// Endpoint answered with an error, an unusable body, or dropped the connection
    ServerError(String),

    /// No answer within the attempt timeout
    Timeout,
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// One call against an endpoint, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttempt {
    pub provider: Provider,
    pub outcome: ResolutionOutcome,
    pub latency: Duration,
}

/// Successful resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Playable audio URL
    pub url: String,

    /// Provider that produced the URL
    pub provider: Provider,

    /// Every attempt made, in order (empty for a direct source URL)
    pub attempts: Vec<ResolutionAttempt>,

    /// Wall time from request to URL, backoff included
    pub elapsed: Duration,

    /// URL came from the track itself, no network involved
    pub direct: bool,
}

/// Resolver tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Per-attempt timeout in milliseconds (default: 4000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt (default: 2)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay in milliseconds (default: 250)
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Backoff ceiling in milliseconds (default: 2000)
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Randomize backoff delays (default: true)
    #[serde(default = "default_jitter")]
    pub jitter: bool,

    /// Consecutive failed resolutions that open a provider's circuit;
    /// 0 disables the breaker (default: 3)
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,

    /// How long an open circuit refuses calls, in milliseconds (default: 30000)
    #[serde(default = "default_breaker_cooldown_ms")]
    pub breaker_cooldown_ms: u64,
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms),
            jitter: self.jitter,
        }
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_millis(self.breaker_cooldown_ms)
    }

    /// Upper bound on one `resolve` call for a single provider
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        self.timeout().saturating_mul(attempts) + self.retry_policy().max_total_delay()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            jitter: default_jitter(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_ms: default_breaker_cooldown_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    4000
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_backoff_max_ms() -> u64 {
    2000
}

fn default_jitter() -> bool {
    true
}

fn default_breaker_threshold() -> u32 {
    3
}

fn default_breaker_cooldown_ms() -> u64 {
    30_000
}
