//! Chain-data provider contract and the pacing/retry policy providers share.
//!
//! The orchestrator is generic over [`ChainDataProvider`] and never inspects
//! concrete types. Providers pace their own outbound requests with a
//! [`RequestPacer`] and retry transient faults with a [`RetryPolicy`] before
//! surfacing a [`ProviderError`].

pub mod error;
pub mod http_indexer;
pub mod pacing;
pub mod retry;

pub use error::ProviderError;
pub use http_indexer::HttpIndexerProvider;
pub use pacing::RequestPacer;
pub use retry::RetryPolicy;

use crate::types::{TokenSummary, WalletInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rate-limit counters reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    pub ceiling: u32,
}

/// Contract every concrete chain-data provider satisfies.
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Stable provider name, used as the health-registry key.
    fn name(&self) -> &str;

    /// Lightweight liveness probe with no other side effects.
    async fn is_available(&self) -> bool;

    async fn get_wallet_info(&self, address: &str) -> Result<WalletInfo, ProviderError>;

    /// `manual_tokens` are token identifiers the caller already knows about;
    /// providers include them alongside whatever they discover.
    async fn get_tokens_created(
        &self,
        address: &str,
        force_refresh: bool,
        manual_tokens: Option<&[String]>,
    ) -> Result<Vec<TokenSummary>, ProviderError>;

    fn rate_limit(&self) -> RateLimitInfo;
}
