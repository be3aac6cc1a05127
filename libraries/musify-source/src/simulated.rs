//! In-process endpoints for demos and tests
//!
//! `FlakyEndpoint` mimics the unreliable stream service: most calls either
//! hang forever or fail. `ScriptedEndpoint` replays a fixed sequence of
//! answers so tests can pin down exactly what the resolver sees.

use crate::endpoint::SourceEndpoint;
use crate::error::EndpointError;
use async_trait::async_trait;
use musify_core::Track;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One scripted answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Answer immediately with this body
    Respond(String),

    /// Answer with this body after a delay
    RespondAfter(Duration, String),

    /// Answer with an error status
    Fail(u16),

    /// Never answer
    Hang,
}

impl ScriptStep {
    pub fn respond(body: impl Into<String>) -> Self {
        Self::Respond(body.into())
    }

    async fn play(self) -> Result<String, EndpointError> {
        match self {
            Self::Respond(body) => Ok(body),
            Self::RespondAfter(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Self::Fail(status) => Err(EndpointError::ServerError {
                status,
                message: "Upstream error".to_string(),
            }),
            Self::Hang => std::future::pending().await,
        }
    }
}

/// Endpoint that replays a script, then repeats a final step forever
pub struct ScriptedEndpoint {
    name: String,
    steps: Mutex<VecDeque<ScriptStep>>,
    exhausted: ScriptStep,
    calls: AtomicUsize,
}

impl ScriptedEndpoint {
    /// Replay `steps` in order, then fail with 500 on every further call.
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            name: "scripted".to_string(),
            steps: Mutex::new(steps.into_iter().collect()),
            exhausted: ScriptStep::Fail(500),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer every call with the same step.
    pub fn always(step: ScriptStep) -> Self {
        Self {
            exhausted: step,
            ..Self::new(Vec::new())
        }
    }

    /// Number of `fetch` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> ScriptStep {
        lock(&self.steps)
            .pop_front()
            .unwrap_or_else(|| self.exhausted.clone())
    }
}

#[async_trait]
impl SourceEndpoint for ScriptedEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _track: &Track) -> Result<String, EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.next_step();
        step.play().await
    }
}

/// Simulated unreliable stream service
///
/// Each call independently hangs (default 40%), fails with 500 (20%), or
/// answers with `{prefix}/{track.id}` (40%).
pub struct FlakyEndpoint {
    rng: Mutex<StdRng>,
    timeout_rate: f64,
    error_rate: f64,
    prefix: String,
    calls: AtomicUsize,
}

impl FlakyEndpoint {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic sequence of outcomes
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            timeout_rate: 0.4,
            error_rate: 0.2,
            prefix: "https://cdn.example/high-bitrate".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Override failure rates. Both are clamped to [0, 1] and their sum to 1.
    pub fn with_rates(mut self, timeout_rate: f64, error_rate: f64) -> Self {
        self.timeout_rate = timeout_rate.clamp(0.0, 1.0);
        self.error_rate = error_rate.clamp(0.0, 1.0 - self.timeout_rate);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn roll(&self, track: &Track) -> ScriptStep {
        let draw: f64 = lock(&self.rng).gen();
        if draw < self.timeout_rate {
            ScriptStep::Hang
        } else if draw < self.timeout_rate + self.error_rate {
            ScriptStep::Fail(500)
        } else {
            ScriptStep::Respond(format!("{}/{}", self.prefix, track.id))
        }
    }
}

impl Default for FlakyEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceEndpoint for FlakyEndpoint {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn fetch(&self, track: &Track) -> Result<String, EndpointError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.roll(track);
        step.play().await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
