//! Oracle module - provider orchestration and deterministic trust scoring.
//!
//! The orchestration half (health registry, orchestrator) turns unreliable
//! chain-data providers into values that never fail. The scoring half
//! (classifier, component scorers, weights, composite scorer) turns those
//! values into a reproducible score. [`TrustOracle`] ties both together.

pub mod types;
pub mod health;
pub mod orchestrator;
pub mod classifier;
pub mod features;
pub mod weights;
pub mod scorer;
pub mod trust_oracle;

pub use types::{
    Confidence, ConfidenceLevel, OracleConfig, ProviderEndpointConfig, ProviderStatus,
    ReportSources, ScoreBreakdown, ScoringResult, Sourced, TrustReport,
};

pub use classifier::{classify, label_tokens, Classification};
pub use health::{ProviderHealth, ProviderHealthRegistry};
pub use orchestrator::ProviderOrchestrator;
pub use scorer::{compute_score, compute_score_at};
pub use trust_oracle::TrustOracle;
pub use weights::{DataAvailability, WeightScheme};

use crate::error::{OracleError, OracleResult};
use crate::providers::{ChainDataProvider, HttpIndexerProvider};
use crate::types::Chain;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy)]
enum Role {
    Both,
    Wallet,
    Tokens,
}

struct Registration {
    chain: Chain,
    provider: Arc<dyn ChainDataProvider>,
    priority: u32,
    role: Role,
}

/// Oracle builder for convenient construction with sensible defaults.
pub struct OracleBuilder {
    config: OracleConfig,
    registrations: Vec<Registration>,
    health: Option<Arc<ProviderHealthRegistry>>,
}

impl OracleBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: OracleConfig::default(),
            registrations: Vec::new(),
            health: None,
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: OracleConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the per-provider call timeout.
    pub fn with_provider_timeout(mut self, timeout_secs: u64) -> Self {
        self.config.provider_timeout_secs = timeout_secs;
        self
    }

    pub fn with_health_check_interval(mut self, interval_secs: u64) -> Self {
        self.config.health_check_interval_secs = interval_secs;
        self
    }

    /// Bound a single provider availability probe.
    pub fn with_health_probe_timeout(mut self, timeout_secs: u64) -> Self {
        self.config.health_probe_timeout_secs = timeout_secs;
        self
    }

    /// Set cache TTL in seconds.
    pub fn with_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.config.cache_ttl_seconds = ttl_seconds;
        self
    }

    /// Set max cache entries.
    pub fn with_max_cache_entries(mut self, max_entries: u64) -> Self {
        self.config.max_cache_entries = max_entries;
        self
    }

    /// Set retry behaviour for configured indexer endpoints.
    pub fn with_retry(mut self, attempts: usize, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.config.retry_attempts = attempts;
        self.config.retry_base_delay_ms = base_delay_ms;
        self.config.retry_max_delay_ms = max_delay_ms;
        self
    }

    /// Add an indexer endpoint to be instantiated at build time.
    pub fn with_endpoint(mut self, endpoint: ProviderEndpointConfig) -> Self {
        self.config.providers.push(endpoint);
        self
    }

    /// Register a provider for both wallet facts and token discovery.
    pub fn with_provider(
        self,
        chain: Chain,
        provider: Arc<dyn ChainDataProvider>,
        priority: u32,
    ) -> Self {
        self.register(chain, provider, priority, Role::Both)
    }

    pub fn with_wallet_provider(
        self,
        chain: Chain,
        provider: Arc<dyn ChainDataProvider>,
        priority: u32,
    ) -> Self {
        self.register(chain, provider, priority, Role::Wallet)
    }

    pub fn with_token_provider(
        self,
        chain: Chain,
        provider: Arc<dyn ChainDataProvider>,
        priority: u32,
    ) -> Self {
        self.register(chain, provider, priority, Role::Tokens)
    }

    /// Share an existing health registry instead of creating one.
    pub fn with_health_registry(mut self, health: Arc<ProviderHealthRegistry>) -> Self {
        self.health = Some(health);
        self
    }

    /// Build the oracle configuration.
    pub fn build_config(self) -> OracleConfig {
        self.config
    }

    /// Build the orchestrator alone.
    pub fn build_orchestrator(self) -> OracleResult<ProviderOrchestrator> {
        self.into_parts().map(|(orchestrator, _)| orchestrator)
    }

    /// Build the oracle. Does not start health checks.
    pub fn build(self) -> OracleResult<TrustOracle> {
        let (orchestrator, config) = self.into_parts()?;
        Ok(TrustOracle::new(Arc::new(orchestrator), config))
    }

    fn register(
        mut self,
        chain: Chain,
        provider: Arc<dyn ChainDataProvider>,
        priority: u32,
        role: Role,
    ) -> Self {
        self.registrations.push(Registration {
            chain,
            provider,
            priority,
            role,
        });
        self
    }

    fn into_parts(self) -> OracleResult<(ProviderOrchestrator, OracleConfig)> {
        self.config.validate()?;

        let health = self.health.unwrap_or_else(|| {
            Arc::new(ProviderHealthRegistry::new(Duration::from_secs(
                self.config.rate_limit_window_secs,
            )))
        });
        let mut orchestrator = ProviderOrchestrator::new(health, self.config.provider_timeout())
            .with_probe_timeout(self.config.health_probe_timeout());

        for endpoint in &self.config.providers {
            let provider = HttpIndexerProvider::from_config(endpoint, &self.config).map_err(|e| {
                OracleError::Config(format!("provider {}: {}", endpoint.name, e))
            })?;
            orchestrator.register(endpoint.chain, Arc::new(provider), endpoint.priority);
        }

        for registration in self.registrations {
            let Registration {
                chain,
                provider,
                priority,
                role,
            } = registration;
            match role {
                Role::Both => orchestrator.register(chain, provider, priority),
                Role::Wallet => orchestrator.register_wallet_provider(chain, provider, priority),
                Role::Tokens => orchestrator.register_token_provider(chain, provider, priority),
            }
        }

        Ok((orchestrator, self.config))
    }
}

impl Default for OracleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_builder() {
        let config = OracleBuilder::new()
            .with_provider_timeout(30)
            .with_cache_ttl(600)
            .with_retry(1, 10, 100)
            .build_config();

        assert_eq!(config.provider_timeout_secs, 30);
        assert_eq!(config.cache_ttl_seconds, 600);
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.retry_max_delay_ms, 100);
    }

    #[test]
    fn test_oracle_builder_defaults() {
        let config = OracleBuilder::new().build_config();

        assert_eq!(config.provider_timeout_secs, 300);
        assert_eq!(config.health_check_interval_secs, 60);
        assert_eq!(config.health_probe_timeout_secs, 5);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.max_cache_entries, 10_000);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = OracleBuilder::new().with_provider_timeout(0).build_orchestrator();
        assert!(matches!(result, Err(OracleError::Config(_))));

        let result = OracleBuilder::new().with_health_probe_timeout(0).build_orchestrator();
        assert!(matches!(result, Err(OracleError::Config(_))));
    }

    #[test]
    fn test_builder_applies_probe_timeout() {
        let orchestrator = OracleBuilder::new()
            .with_provider_timeout(120)
            .with_health_probe_timeout(3)
            .build_orchestrator()
            .unwrap();

        assert_eq!(orchestrator.call_timeout(), Duration::from_secs(120));
        assert_eq!(orchestrator.probe_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_builder_instantiates_endpoints() {
        let orchestrator = OracleBuilder::new()
            .with_endpoint(ProviderEndpointConfig {
                name: "indexer-eth".to_string(),
                chain: Chain::Ethereum,
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: None,
                priority: 1,
                max_requests_per_second: 2.0,
                requests_per_window: 50,
            })
            .build_orchestrator()
            .unwrap();

        assert_eq!(orchestrator.supported_chains(), vec![Chain::Ethereum]);
        let statuses = orchestrator.get_provider_statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].name, "indexer-eth");
        assert_eq!(statuses[0].rate_limit.ceiling, 50);
    }
}
