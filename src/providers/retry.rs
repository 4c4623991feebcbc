//! Bounded retry with exponential backoff for transient provider faults.

use crate::providers::ProviderError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::debug;

/// Jitter applied to each delay, as a percentage either side.
const JITTER_PERCENT: u64 = 20;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// Floor delay, also the first backoff step.
    pub base_delay: Duration,
    /// Ceiling delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Backoff schedule: base, 2×base, 4×base, ... capped at `max_delay`,
    /// each jittered by ±20% and kept within the floor and ceiling.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let base_ms = (self.base_delay.as_millis() as u64).max(1);
        let floor = self.base_delay;
        let ceiling = self.max_delay.max(floor);

        // `from_millis(2).factor(b)` yields 2b, 4b, ...; halve so the first step is b.
        ExponentialBackoff::from_millis(2)
            .factor(base_ms.div_ceil(2))
            .max_delay(ceiling)
            .map(move |delay| with_jitter(delay).clamp(floor, ceiling))
            .take(self.max_retries)
    }

    /// Run `action`, retrying only when the error is transient.
    pub async fn run<T, A, Fut>(&self, action: A) -> Result<T, ProviderError>
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        RetryIf::spawn(self.delays(), action, |err: &ProviderError| {
            let retry = err.is_transient();
            if retry {
                debug!("Retrying after transient provider error: {}", err);
            }
            retry
        })
        .await
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as u64;
    let range = (millis * JITTER_PERCENT / 100) as i64;
    if range == 0 {
        return delay;
    }
    let jitter = rand::thread_rng().gen_range(-range..=range);
    Duration::from_millis((millis as i64 + jitter).max(0) as u64)
}
