//! Provider orchestrator.
//!
//! Keeps two provider sets per chain (wallet facts and token discovery), each
//! ordered by ascending priority. A request walks its candidates strictly one
//! at a time; each attempt races the configured timeout, and any error or
//! timeout marks the provider unhealthy and moves on. When nothing answers,
//! the benign default is returned. Provider faults never reach the caller.
//!
//! Recovery of an unhealthy provider is only detected by the background
//! health probe, so a failing provider costs at most one timeout per request
//! cycle.
//!
//! A request every provider would reject (malformed address, unsupported
//! chain) is not an outage: it stops failover, leaves health untouched and
//! is reported by the `try_fetch_*` variants.

use crate::oracle::health::ProviderHealthRegistry;
use crate::oracle::types::{ProviderStatus, Sourced};
use crate::providers::{ChainDataProvider, ProviderError};
use crate::types::{Chain, TokenSummary, WalletInfo};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// Upper bound for one `is_available` probe, unless the call timeout is lower.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct RegisteredProvider {
    provider: Arc<dyn ChainDataProvider>,
    priority: u32,
}

impl RegisteredProvider {
    fn name(&self) -> &str {
        self.provider.name()
    }
}

type ProviderSet = HashMap<Chain, Vec<RegisteredProvider>>;

pub struct ProviderOrchestrator {
    wallet_providers: ProviderSet,
    token_providers: ProviderSet,
    health: Arc<ProviderHealthRegistry>,
    call_timeout: Duration,
    probe_timeout: Duration,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProviderOrchestrator {
    pub fn new(health: Arc<ProviderHealthRegistry>, call_timeout: Duration) -> Self {
        Self {
            wallet_providers: HashMap::new(),
            token_providers: HashMap::new(),
            health,
            call_timeout,
            probe_timeout: DEFAULT_PROBE_TIMEOUT.min(call_timeout),
            health_task: Mutex::new(None),
        }
    }

    /// Bound availability probes separately from data calls.
    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn health(&self) -> &Arc<ProviderHealthRegistry> {
        &self.health
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn register_wallet_provider(
        &mut self,
        chain: Chain,
        provider: Arc<dyn ChainDataProvider>,
        priority: u32,
    ) {
        self.health.register(provider.name(), provider.rate_limit());
        insert_sorted(&mut self.wallet_providers, chain, provider, priority);
    }

    pub fn register_token_provider(
        &mut self,
        chain: Chain,
        provider: Arc<dyn ChainDataProvider>,
        priority: u32,
    ) {
        self.health.register(provider.name(), provider.rate_limit());
        insert_sorted(&mut self.token_providers, chain, provider, priority);
    }

    /// Register a provider for both wallet facts and token discovery.
    pub fn register(&mut self, chain: Chain, provider: Arc<dyn ChainDataProvider>, priority: u32) {
        self.register_wallet_provider(chain, provider.clone(), priority);
        self.register_token_provider(chain, provider, priority);
    }

    /// Chains with at least one registered provider of either kind.
    pub fn supported_chains(&self) -> Vec<Chain> {
        let mut chains: Vec<Chain> = self
            .wallet_providers
            .keys()
            .chain(self.token_providers.keys())
            .copied()
            .collect();
        chains.sort();
        chains.dedup();
        chains
    }

    /// Wallet facts for `address`, or the benign default. Never fails.
    pub async fn get_wallet_info(&self, address: &str, chain: Chain) -> WalletInfo {
        self.fetch_wallet_info(address, chain).await.value
    }

    /// Created tokens for `address`, or an empty list. Never fails.
    pub async fn get_tokens_created(
        &self,
        address: &str,
        chain: Chain,
        force_refresh: bool,
        manual_tokens: Option<&[String]>,
    ) -> Vec<TokenSummary> {
        self.fetch_tokens_created(address, chain, force_refresh, manual_tokens)
            .await
            .value
    }

    /// Like [`Self::get_wallet_info`], also naming the provider that answered.
    pub async fn fetch_wallet_info(&self, address: &str, chain: Chain) -> Sourced<WalletInfo> {
        self.try_fetch_wallet_info(address, chain)
            .await
            .unwrap_or_else(|_| Sourced::fallback(WalletInfo::unknown()))
    }

    /// Like [`Self::get_tokens_created`], also naming the provider that answered.
    pub async fn fetch_tokens_created(
        &self,
        address: &str,
        chain: Chain,
        force_refresh: bool,
        manual_tokens: Option<&[String]>,
    ) -> Sourced<Vec<TokenSummary>> {
        self.try_fetch_tokens_created(address, chain, force_refresh, manual_tokens)
            .await
            .unwrap_or_else(|_| Sourced::fallback(Vec::new()))
    }

    /// Wallet facts, the default when every provider failed, or the error
    /// when a provider rejected the request itself.
    #[instrument(skip(self), fields(address = %address, chain = %chain))]
    pub async fn try_fetch_wallet_info(
        &self,
        address: &str,
        chain: Chain,
    ) -> Result<Sourced<WalletInfo>, ProviderError> {
        let address = address.to_string();
        let result = self
            .failover("wallet info", chain, &self.wallet_providers, |provider| {
                let address = address.clone();
                async move { provider.get_wallet_info(&address).await }
            })
            .await?;

        Ok(result.unwrap_or_else(|| Sourced::fallback(WalletInfo::unknown())))
    }

    /// Token counterpart of [`Self::try_fetch_wallet_info`].
    #[instrument(skip(self, manual_tokens), fields(address = %address, chain = %chain))]
    pub async fn try_fetch_tokens_created(
        &self,
        address: &str,
        chain: Chain,
        force_refresh: bool,
        manual_tokens: Option<&[String]>,
    ) -> Result<Sourced<Vec<TokenSummary>>, ProviderError> {
        let address = address.to_string();
        let manual: Option<Vec<String>> = manual_tokens.map(<[String]>::to_vec);
        let result = self
            .failover("tokens created", chain, &self.token_providers, |provider| {
                let address = address.clone();
                let manual = manual.clone();
                async move {
                    provider
                        .get_tokens_created(&address, force_refresh, manual.as_deref())
                        .await
                }
            })
            .await?;

        Ok(result.unwrap_or_else(|| Sourced::fallback(Vec::new())))
    }

    /// Candidates for `chain` that are healthy and currently report available,
    /// in priority order.
    async fn available_providers(&self, set: &ProviderSet, chain: Chain) -> Vec<RegisteredProvider> {
        let mut available = Vec::new();
        for candidate in set.get(&chain).into_iter().flatten() {
            if !self.health.is_healthy(candidate.name()) {
                debug!("Skipping unhealthy provider {}", candidate.name());
                continue;
            }

            match tokio::time::timeout(self.probe_timeout, candidate.provider.is_available()).await {
                Ok(true) => available.push(candidate.clone()),
                Ok(false) => debug!("Provider {} reports unavailable", candidate.name()),
                Err(_) => debug!("Provider {} availability check timed out", candidate.name()),
            }
        }
        available
    }

    /// Sequential priority-ordered failover. Each attempt is raced against the
    /// call timeout; a timed-out attempt is dropped, which cancels it.
    /// `Ok(None)` means nothing answered.
    async fn failover<T, F, Fut>(
        &self,
        operation: &str,
        chain: Chain,
        set: &ProviderSet,
        call: F,
    ) -> Result<Option<Sourced<T>>, ProviderError>
    where
        F: Fn(Arc<dyn ChainDataProvider>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let candidates = self.available_providers(set, chain).await;
        if candidates.is_empty() {
            warn!("No available providers for {} on {}", operation, chain);
            return Ok(None);
        }

        for candidate in candidates {
            let name = candidate.name().to_string();
            debug!("Requesting {} from {} (priority {})", operation, name, candidate.priority);

            let outcome = tokio::time::timeout(self.call_timeout, call(candidate.provider.clone())).await;
            match outcome {
                Ok(Ok(value)) => {
                    self.health.record_success(&name);
                    debug!("Provider {} answered {} for {}", name, operation, chain);
                    return Ok(Some(Sourced::from_provider(value, name)));
                }
                Ok(Err(err)) if err.is_caller_fault() => {
                    warn!("Provider {} rejected {} request on {}: {}", name, operation, chain, err);
                    return Err(err);
                }
                Ok(Err(err)) => {
                    warn!("Provider {} failed {} on {}: {}", name, operation, chain, err);
                    self.health.mark_unhealthy(&name, &err.to_string());
                }
                Err(_) => {
                    let err = ProviderError::Timeout(self.call_timeout);
                    warn!("Provider {} failed {} on {}: {}", name, operation, chain, err);
                    self.health.mark_unhealthy(&name, &err.to_string());
                }
            }
        }

        warn!("All providers failed {} on {}, using default", operation, chain);
        Ok(None)
    }

    /// Probe every registered provider and overwrite its health flag.
    #[instrument(skip(self))]
    pub async fn refresh_health(&self) {
        for registered in self.unique_providers().into_values() {
            let name = registered.name().to_string();
            let available = tokio::time::timeout(self.probe_timeout, registered.provider.is_available())
                .await
                .unwrap_or(false);

            self.health.set_healthy(&name, available);
            self.health.sync_rate_limit(&name, registered.provider.rate_limit());
        }
        debug!("Refreshed health for {} providers", self.health.len());
    }

    /// Start the background health probe, replacing any running one.
    pub fn start_health_checks(self: &Arc<Self>, interval: Duration) {
        if interval.is_zero() {
            warn!("Health check interval is zero, background probing disabled");
            return;
        }

        let orchestrator = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; probing starts one interval in.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match orchestrator.upgrade() {
                    Some(orchestrator) => orchestrator.refresh_health().await,
                    None => break,
                }
            }
        });

        if let Some(previous) = self.lock_health_task().replace(handle) {
            previous.abort();
        }
        info!("Started provider health checks every {:?}", interval);
    }

    pub fn stop_health_checks(&self) {
        if let Some(handle) = self.lock_health_task().take() {
            handle.abort();
            info!("Stopped provider health checks");
        }
    }

    pub fn health_checks_running(&self) -> bool {
        self.lock_health_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Diagnostic snapshot of every registered provider, by priority.
    pub fn get_provider_statuses(&self) -> Vec<ProviderStatus> {
        let mut chains_by_name: HashMap<String, Vec<Chain>> = HashMap::new();
        for (chain, providers) in self.wallet_providers.iter().chain(self.token_providers.iter()) {
            for registered in providers {
                let chains = chains_by_name.entry(registered.name().to_string()).or_default();
                if !chains.contains(chain) {
                    chains.push(*chain);
                }
            }
        }

        let mut statuses: Vec<ProviderStatus> = self
            .unique_providers()
            .into_iter()
            .map(|(name, registered)| {
                let health = self.health.get(&name);
                let mut chains = chains_by_name.remove(&name).unwrap_or_default();
                chains.sort();

                ProviderStatus {
                    healthy: health.as_ref().map_or(true, |h| h.healthy),
                    rate_limit: registered.provider.rate_limit(),
                    consecutive_failures: health.as_ref().map_or(0, |h| h.consecutive_failures),
                    last_error: health.and_then(|h| h.last_error),
                    priority: registered.priority,
                    chains,
                    name,
                }
            })
            .collect();

        statuses.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        statuses
    }

    /// Each provider once, at its best (lowest) priority.
    fn unique_providers(&self) -> BTreeMap<String, RegisteredProvider> {
        let mut unique: BTreeMap<String, RegisteredProvider> = BTreeMap::new();
        for registered in self
            .wallet_providers
            .values()
            .chain(self.token_providers.values())
            .flatten()
        {
            unique
                .entry(registered.name().to_string())
                .and_modify(|existing| {
                    if registered.priority < existing.priority {
                        *existing = registered.clone();
                    }
                })
                .or_insert_with(|| registered.clone());
        }
        unique
    }

    fn lock_health_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.health_task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ProviderOrchestrator {
    fn drop(&mut self) {
        self.stop_health_checks();
    }
}

fn insert_sorted(set: &mut ProviderSet, chain: Chain, provider: Arc<dyn ChainDataProvider>, priority: u32) {
    let providers = set.entry(chain).or_default();
    providers.retain(|existing| existing.name() != provider.name());
    providers.push(RegisteredProvider { provider, priority });
    // Stable: equal priorities keep registration order.
    providers.sort_by_key(|registered| registered.priority);
}
