//! Provider health registry.
//!
//! Per-provider availability flag and rate-limit counters. Three mutation
//! paths: call outcomes (`mark_unhealthy` / `record_success`), the periodic
//! probe (`set_healthy`), and best-effort rate-limit ingestion. Each is a
//! short read-modify-write on one `DashMap` shard; reads never block on a
//! suspended writer and no lock is held across an await.

use crate::providers::RateLimitInfo;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Health and rate-limit state of one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHealth {
    pub healthy: bool,
    pub rate_limit_remaining: u32,
    pub rate_limit_reset_at: DateTime<Utc>,
    pub rate_limit_ceiling: u32,
    pub consecutive_failures: u32,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ProviderHealth {
    fn new(ceiling: u32, window: chrono::Duration) -> Self {
        Self {
            healthy: true,
            rate_limit_remaining: ceiling,
            rate_limit_reset_at: Utc::now() + window,
            rate_limit_ceiling: ceiling,
            consecutive_failures: 0,
            last_failure: None,
            last_error: None,
        }
    }

    pub fn rate_limit(&self) -> RateLimitInfo {
        RateLimitInfo {
            remaining: self.rate_limit_remaining,
            reset_at: self.rate_limit_reset_at,
            ceiling: self.rate_limit_ceiling,
        }
    }
}

/// Registry shared between the orchestrator's request path and its
/// background prober. Inject one per orchestrator.
pub struct ProviderHealthRegistry {
    entries: DashMap<String, ProviderHealth>,
    window: chrono::Duration,
}

impl ProviderHealthRegistry {
    pub fn new(window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            window: chrono::Duration::from_std(window)
                .unwrap_or_else(|_| chrono::Duration::seconds(60)),
        }
    }

    /// Add a provider as healthy. Re-registering keeps existing state.
    pub fn register(&self, name: &str, rate_limit: RateLimitInfo) {
        self.entries.entry(name.to_string()).or_insert_with(|| {
            let mut health = ProviderHealth::new(rate_limit.ceiling, self.window);
            health.rate_limit_remaining = rate_limit.remaining;
            health.rate_limit_reset_at = rate_limit.reset_at;
            health
        });
    }

    /// Record a failed or timed-out call.
    #[instrument(skip(self))]
    pub fn mark_unhealthy(&self, name: &str, reason: &str) {
        let mut health = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| ProviderHealth::new(0, self.window));
        health.healthy = false;
        health.consecutive_failures += 1;
        health.last_failure = Some(Utc::now());
        health.last_error = Some(reason.to_string());

        warn!(
            "Provider {} marked unhealthy after {} consecutive failures: {}",
            name, health.consecutive_failures, reason
        );
    }

    /// Overwrite the availability flag from a fresh probe.
    pub fn set_healthy(&self, name: &str, healthy: bool) {
        if let Some(mut health) = self.entries.get_mut(name) {
            if health.healthy != healthy {
                debug!("Provider {} health changed: {} -> {}", name, health.healthy, healthy);
            }
            health.healthy = healthy;
            if healthy {
                health.consecutive_failures = 0;
            }
        }
    }

    /// Count a successful call against the provider's request window.
    pub fn record_success(&self, name: &str) {
        if let Some(mut health) = self.entries.get_mut(name) {
            let now = Utc::now();
            if now >= health.rate_limit_reset_at {
                health.rate_limit_remaining = health.rate_limit_ceiling;
                health.rate_limit_reset_at = now + self.window;
            }
            health.rate_limit_remaining = health.rate_limit_remaining.saturating_sub(1);
            health.consecutive_failures = 0;
        }
    }

    /// Best-effort counter update. `None` leaves the prior value unchanged.
    pub fn ingest_rate_limit(
        &self,
        name: &str,
        remaining: Option<u32>,
        reset_at: Option<DateTime<Utc>>,
        ceiling: Option<u32>,
    ) {
        if let Some(mut health) = self.entries.get_mut(name) {
            if let Some(ceiling) = ceiling {
                health.rate_limit_ceiling = ceiling;
            }
            if let Some(remaining) = remaining {
                health.rate_limit_remaining = remaining;
            }
            if let Some(reset_at) = reset_at {
                health.rate_limit_reset_at = reset_at;
            }
        }
    }

    /// Adopt the counters a provider reports about itself.
    pub fn sync_rate_limit(&self, name: &str, info: RateLimitInfo) {
        self.ingest_rate_limit(name, Some(info.remaining), Some(info.reset_at), Some(info.ceiling));
    }

    /// Unknown providers are treated as healthy.
    pub fn is_healthy(&self, name: &str) -> bool {
        self.entries.get(name).map_or(true, |health| health.healthy)
    }

    pub fn get(&self, name: &str) -> Option<ProviderHealth> {
        self.entries.get(name).map(|health| health.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProviderHealthRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}
