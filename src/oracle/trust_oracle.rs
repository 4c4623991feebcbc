//! Trust oracle service facade.
//!
//! Validates input, serves cached reports, fetches wallet facts and token
//! launches concurrently through the orchestrator, classifies and scores,
//! and attaches the provider snapshot.

use crate::error::{OracleError, OracleResult};
use crate::oracle::classifier::label_tokens;
use crate::oracle::orchestrator::ProviderOrchestrator;
use crate::oracle::scorer::compute_score_at;
use crate::oracle::types::{OracleConfig, ProviderStatus, ReportSources, TrustReport};
use crate::types::Chain;
use chrono::Utc;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub struct TrustOracle {
    orchestrator: Arc<ProviderOrchestrator>,
    cache: Cache<String, TrustReport>,
    config: OracleConfig,
}

impl TrustOracle {
    pub fn new(orchestrator: Arc<ProviderOrchestrator>, config: OracleConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_cache_entries)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .build();

        info!(
            "Created trust oracle for chains {:?}",
            orchestrator.supported_chains()
        );

        Self {
            orchestrator,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<ProviderOrchestrator> {
        &self.orchestrator
    }

    /// Start the background provider health probe at the configured interval.
    pub fn start_health_checks(&self) {
        self.orchestrator
            .start_health_checks(self.config.health_check_interval());
    }

    pub fn stop_health_checks(&self) {
        self.orchestrator.stop_health_checks();
    }

    pub fn provider_statuses(&self) -> Vec<ProviderStatus> {
        self.orchestrator.get_provider_statuses()
    }

    /// Analyse a wallet and return its trust report.
    ///
    /// A cached report is returned unless `force_refresh` is set or manual
    /// tokens are supplied. A fresh report replaces the cache entry only when
    /// a provider answered both sub-fetches; reports built from defaults are
    /// never cached, so recovered providers are used on the next call.
    /// Fails only on invalid input.
    #[instrument(skip(self, manual_tokens), fields(address = %address, chain = %chain))]
    pub async fn analyze(
        &self,
        address: &str,
        chain: Chain,
        force_refresh: bool,
        manual_tokens: Option<&[String]>,
    ) -> OracleResult<TrustReport> {
        let address = chain
            .validate_address(address)
            .ok_or_else(|| OracleError::Validation(format!("invalid address {:?}", address)))?;

        if !self.orchestrator.supported_chains().contains(&chain) {
            return Err(OracleError::Validation(format!(
                "no providers configured for {}",
                chain
            )));
        }

        let manual_tokens = manual_tokens.filter(|tokens| !tokens.is_empty());
        let key = cache_key(chain, &address);

        if !force_refresh && manual_tokens.is_none() {
            if let Some(mut report) = self.cache.get(&key).await {
                debug!("Serving cached trust report");
                report.cached = true;
                return Ok(report);
            }
        }

        let (wallet, tokens) = tokio::join!(
            self.orchestrator.try_fetch_wallet_info(&address, chain),
            self.orchestrator
                .try_fetch_tokens_created(&address, chain, force_refresh, manual_tokens),
        );
        let wallet = wallet.map_err(|e| OracleError::Validation(e.to_string()))?;
        let tokens = tokens.map_err(|e| OracleError::Validation(e.to_string()))?;

        let now = Utc::now();
        let wallet_info = wallet.value.with_derived_age(now);
        let mut token_list = tokens.value;
        label_tokens(&mut token_list);

        let scoring = compute_score_at(&wallet_info, &token_list, now);

        let report = TrustReport {
            address,
            chain,
            scoring,
            wallet: wallet_info,
            tokens: token_list,
            sources: ReportSources {
                wallet_info: wallet.provider,
                tokens: tokens.provider,
            },
            providers: self.orchestrator.get_provider_statuses(),
            analyzed_at: now,
            cached: false,
        };

        if report.sources.wallet_info.is_some() && report.sources.tokens.is_some() {
            self.cache.insert(key, report.clone()).await;
        } else {
            debug!("Not caching report built from fallback defaults");
        }

        info!(
            score = report.scoring.score,
            confidence = %report.scoring.confidence.level,
            tokens = report.tokens.len(),
            "Analysed wallet"
        );
        Ok(report)
    }

    /// Drop any cached report for the wallet.
    pub async fn invalidate(&self, address: &str, chain: Chain) {
        if let Some(address) = chain.validate_address(address) {
            self.cache.invalidate(&cache_key(chain, &address)).await;
        }
    }
}

/// Cache key for a normalised address.
pub fn cache_key(chain: Chain, address: &str) -> String {
    format!("trust:{}:{}", chain, address)
}
