//! Wallet trust oracle.
//!
//! Assigns a deterministic 0-100 trust score to a wallet from its on-chain
//! age, activity, and token-launch history, gathered from prioritised
//! chain-data providers with timeouts and failover.

pub mod error;
pub mod oracle;
pub mod providers;
pub mod types;

pub use error::{OracleError, OracleResult};
pub use oracle::{
    compute_score, compute_score_at, OracleBuilder, OracleConfig, ProviderOrchestrator,
    ScoringResult, TrustOracle, TrustReport,
};
pub use providers::{ChainDataProvider, ProviderError, RateLimitInfo};
pub use types::{Chain, Outcome, TokenSummary, WalletInfo};
