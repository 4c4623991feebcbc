//! Request pacing for outbound provider calls.
//!
//! Two gates run before every request: a `governor` limiter that enforces the
//! minimum interval derived from the configured requests-per-second, and a
//! per-window counter that blocks until the window resets once it reaches
//! zero. Backpressure, not rejection: callers are delayed, never refused.

use crate::providers::RateLimitInfo;
use chrono::{DateTime, TimeZone, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, instrument};

const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_LIMIT: &str = "x-ratelimit-limit";
const HEADER_RESET: &str = "x-ratelimit-reset";

/// Values above this in a reset header are absolute epoch seconds rather
/// than seconds-until-reset.
const EPOCH_RESET_THRESHOLD: i64 = 1_000_000_000;

#[derive(Debug)]
struct WindowState {
    ceiling: u32,
    remaining: u32,
    reset_at: DateTime<Utc>,
}

/// Paces requests for one provider instance.
pub struct RequestPacer {
    /// Minimum-interval gate; `None` when no per-second cap is configured.
    limiter: Option<DefaultDirectRateLimiter>,
    window: Mutex<WindowState>,
    window_length: chrono::Duration,
}

impl RequestPacer {
    /// Create a pacer allowing `max_requests_per_second` (burst of one) and
    /// `requests_per_window` per `window` duration.
    pub fn new(max_requests_per_second: f64, requests_per_window: u32, window: Duration) -> Self {
        let limiter = min_interval_quota(max_requests_per_second).map(RateLimiter::direct);
        let window_length =
            chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::seconds(60));
        let ceiling = requests_per_window.max(1);

        Self {
            limiter,
            window: Mutex::new(WindowState {
                ceiling,
                remaining: ceiling,
                reset_at: Utc::now() + window_length,
            }),
            window_length,
        }
    }

    /// Wait until a request may be sent, then consume one slot.
    #[instrument(skip(self))]
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        loop {
            let wait = {
                let mut window = self.lock();
                let now = Utc::now();
                if now >= window.reset_at {
                    window.remaining = window.ceiling;
                    window.reset_at = now + self.window_length;
                }

                if window.remaining > 0 {
                    window.remaining -= 1;
                    None
                } else {
                    Some((window.reset_at - now).to_std().unwrap_or_default())
                }
            };

            match wait {
                None => return,
                Some(delay) => {
                    debug!("Request window exhausted, sleeping {:?} until reset", delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Current counters.
    pub fn rate_limit(&self) -> RateLimitInfo {
        let window = self.lock();
        RateLimitInfo {
            remaining: window.remaining,
            reset_at: window.reset_at,
            ceiling: window.ceiling,
        }
    }

    /// Overwrite counters with values reported by the upstream service.
    /// `None` leaves the previous value in place.
    pub fn ingest(
        &self,
        remaining: Option<u32>,
        ceiling: Option<u32>,
        reset_at: Option<DateTime<Utc>>,
    ) {
        let mut window = self.lock();
        if let Some(ceiling) = ceiling {
            window.ceiling = ceiling.max(1);
        }
        if let Some(remaining) = remaining {
            window.remaining = remaining.min(window.ceiling);
        }
        if let Some(reset_at) = reset_at {
            window.reset_at = reset_at;
        }
    }

    /// Best-effort ingestion of `x-ratelimit-*` response headers.
    pub fn ingest_headers(&self, headers: &HeaderMap) {
        let remaining = header_number(headers, HEADER_REMAINING).and_then(to_u32);
        let ceiling = header_number(headers, HEADER_LIMIT).and_then(to_u32);
        let reset_at = header_number(headers, HEADER_RESET).and_then(|value| {
            if value >= EPOCH_RESET_THRESHOLD {
                Utc.timestamp_opt(value, 0).single()
            } else {
                Some(Utc::now() + chrono::Duration::seconds(value.max(0)))
            }
        });

        if remaining.is_some() || ceiling.is_some() || reset_at.is_some() {
            debug!(?remaining, ?ceiling, ?reset_at, "Ingested rate-limit headers");
        }
        self.ingest(remaining, ceiling, reset_at);
    }

    /// Block further requests for `delay`, as after a 429 with `Retry-After`.
    pub fn defer(&self, delay: Duration) {
        let delay = chrono::Duration::from_std(delay).unwrap_or(self.window_length);
        let mut window = self.lock();
        window.remaining = 0;
        window.reset_at = Utc::now() + delay;
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.window.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn min_interval_quota(max_requests_per_second: f64) -> Option<Quota> {
    if !max_requests_per_second.is_finite() || max_requests_per_second <= 0.0 {
        return None;
    }

    Quota::with_period(Duration::from_secs_f64(1.0 / max_requests_per_second))
        .map(|quota| quota.allow_burst(NonZeroU32::MIN))
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value as i64)
}

fn to_u32(value: i64) -> Option<u32> {
    u32::try_from(value.max(0)).ok()
}
