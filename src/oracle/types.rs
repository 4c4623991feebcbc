//! Configuration and result types for the trust oracle.

use crate::error::OracleError;
use crate::providers::{RateLimitInfo, RetryPolicy};
use crate::types::{Chain, TokenSummary, WalletInfo};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Connection settings for one configured indexer endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpointConfig {
    pub name: String,
    pub chain: Chain,
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Lower values are tried first.
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_requests_per_second")]
    pub max_requests_per_second: f64,
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,
}

fn default_requests_per_second() -> f64 {
    5.0
}

fn default_requests_per_window() -> u32 {
    300
}

/// Oracle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Per-provider call timeout. Large by default: some chains need
    /// thousands of records scanned per wallet.
    pub provider_timeout_secs: u64,
    /// Interval of the background health probe.
    pub health_check_interval_secs: u64,
    /// Bound on a single `is_available` probe, on the request path and in
    /// the background loop.
    pub health_probe_timeout_secs: u64,
    /// TTL of cached trust reports.
    pub cache_ttl_seconds: u64,
    pub max_cache_entries: u64,
    /// Length of a provider's request-count window.
    pub rate_limit_window_secs: u64,
    /// Retries after the first attempt for transient provider faults.
    pub retry_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Indexer endpoints to instantiate at build time.
    pub providers: Vec<ProviderEndpointConfig>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 300,
            health_check_interval_secs: 60,
            health_probe_timeout_secs: 5,
            cache_ttl_seconds: 300,
            max_cache_entries: 10_000,
            rate_limit_window_secs: 60,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 10_000,
            providers: Vec::new(),
        }
    }
}

impl OracleConfig {
    /// Load configuration from `TRUST_*` environment variables over defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`OracleConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        fn parse<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
            target: &mut T,
        ) -> Result<()>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            if let Some(raw) = lookup(key) {
                *target = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Failed to parse {} = {:?}", key, raw))?;
            }
            Ok(())
        }

        parse(&lookup, "TRUST_PROVIDER_TIMEOUT_SECS", &mut config.provider_timeout_secs)?;
        parse(&lookup, "TRUST_HEALTH_CHECK_INTERVAL_SECS", &mut config.health_check_interval_secs)?;
        parse(&lookup, "TRUST_HEALTH_PROBE_TIMEOUT_SECS", &mut config.health_probe_timeout_secs)?;
        parse(&lookup, "TRUST_CACHE_TTL_SECONDS", &mut config.cache_ttl_seconds)?;
        parse(&lookup, "TRUST_MAX_CACHE_ENTRIES", &mut config.max_cache_entries)?;
        parse(&lookup, "TRUST_RATE_LIMIT_WINDOW_SECS", &mut config.rate_limit_window_secs)?;
        parse(&lookup, "TRUST_RETRY_ATTEMPTS", &mut config.retry_attempts)?;
        parse(&lookup, "TRUST_RETRY_BASE_DELAY_MS", &mut config.retry_base_delay_ms)?;
        parse(&lookup, "TRUST_RETRY_MAX_DELAY_MS", &mut config.retry_max_delay_ms)?;

        if let Some(raw) = lookup("TRUST_PROVIDERS") {
            config.providers = serde_json::from_str(&raw)
                .context("Failed to parse TRUST_PROVIDERS as a JSON array of endpoints")?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OracleError> {
        if self.provider_timeout_secs == 0 {
            return Err(OracleError::Config(
                "provider_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.health_probe_timeout_secs == 0 {
            return Err(OracleError::Config(
                "health_probe_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(OracleError::Config(
                "rate_limit_window_secs must be greater than zero".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for endpoint in &self.providers {
            if endpoint.name.trim().is_empty() {
                return Err(OracleError::Config("provider name must not be empty".to_string()));
            }
            if endpoint.base_url.trim().is_empty() {
                return Err(OracleError::Config(format!(
                    "provider {} has no base_url",
                    endpoint.name
                )));
            }
            if !endpoint.max_requests_per_second.is_finite() || endpoint.max_requests_per_second < 0.0 {
                return Err(OracleError::Config(format!(
                    "provider {} has an invalid max_requests_per_second",
                    endpoint.name
                )));
            }
            // A provider serving several chains is configured once per chain.
            if !names.insert((endpoint.name.as_str(), endpoint.chain)) {
                return Err(OracleError::Config(format!(
                    "provider {} is configured twice for {}",
                    endpoint.name, endpoint.chain
                )));
            }
        }

        Ok(())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.health_probe_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }
}

/// Per-component scores plus the final weighted score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub wallet_age_score: u8,
    pub activity_score: u8,
    pub token_outcome_score: u8,
    pub heuristics_score: u8,
    /// Always equal to [`ScoringResult::score`].
    #[serde(rename = "final")]
    pub final_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM-LOW")]
    MediumLow,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
}

impl ConfidenceLevel {
    /// Map a data-completeness fraction to a level.
    pub fn from_completeness(completeness: f64) -> Self {
        if completeness >= 0.75 {
            ConfidenceLevel::High
        } else if completeness >= 0.5 {
            ConfidenceLevel::Medium
        } else if completeness >= 0.25 {
            ConfidenceLevel::MediumLow
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "HIGH",
            ConfidenceLevel::Medium => "MEDIUM",
            ConfidenceLevel::MediumLow => "MEDIUM-LOW",
            ConfidenceLevel::Low => "LOW",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub reason: String,
    pub data_completeness: f64,
}

/// Result of scoring one wallet. Field names are part of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub score: u8,
    pub breakdown: ScoreBreakdown,
    pub notes: Vec<String>,
    pub confidence: Confidence,
}

/// A fetched value and the provider that produced it.
/// `provider` is `None` when every candidate failed and the default was used.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub provider: Option<String>,
}

impl<T> Sourced<T> {
    pub fn from_provider(value: T, provider: impl Into<String>) -> Self {
        Self {
            value,
            provider: Some(provider.into()),
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            provider: None,
        }
    }
}

/// Diagnostic snapshot of one registered provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    pub priority: u32,
    pub chains: Vec<Chain>,
    pub healthy: bool,
    pub rate_limit: RateLimitInfo,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Which provider answered each sub-fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSources {
    pub wallet_info: Option<String>,
    pub tokens: Option<String>,
}

/// Full analysis returned by [`crate::oracle::TrustOracle::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustReport {
    pub address: String,
    pub chain: Chain,
    #[serde(flatten)]
    pub scoring: ScoringResult,
    pub wallet: WalletInfo,
    pub tokens: Vec<TokenSummary>,
    pub sources: ReportSources,
    pub providers: Vec<ProviderStatus>,
    pub analyzed_at: DateTime<Utc>,
    /// Set when the report was served from cache.
    #[serde(default)]
    pub cached: bool,
}
