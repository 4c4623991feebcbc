//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wallet_trust_oracle::{ChainDataProvider, ProviderError, RateLimitInfo, TokenSummary, WalletInfo};

/// Scriptable in-memory provider.
pub struct FakeProvider {
    name: String,
    wallet: WalletInfo,
    tokens: Vec<TokenSummary>,
    available: AtomicBool,
    failing: AtomicBool,
    rejecting: AtomicBool,
    delay: Option<Duration>,
    probe_delay: Option<Duration>,
    pub wallet_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
    pub last_manual: Mutex<Option<Vec<String>>>,
}

impl FakeProvider {
    pub fn answering(name: &str, wallet: WalletInfo, tokens: Vec<TokenSummary>) -> Self {
        Self {
            name: name.to_string(),
            wallet,
            tokens,
            available: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            rejecting: AtomicBool::new(false),
            delay: None,
            probe_delay: None,
            wallet_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
            last_manual: Mutex::new(None),
        }
    }

    pub fn failing(name: &str) -> Self {
        let provider = Self::answering(name, WalletInfo::unknown(), Vec::new());
        provider.set_failing(true);
        provider
    }

    /// Answers only after `delay`.
    pub fn slow(name: &str, delay: Duration, wallet: WalletInfo) -> Self {
        Self {
            delay: Some(delay),
            ..Self::answering(name, wallet, Vec::new())
        }
    }

    /// Rejects every address as malformed.
    pub fn rejecting(name: &str, wallet: WalletInfo) -> Self {
        let provider = Self::answering(name, wallet, Vec::new());
        provider.rejecting.store(true, Ordering::SeqCst);
        provider
    }

    /// `is_available` answers only after `delay`.
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn wallet_calls(&self) -> usize {
        self.wallet_calls.load(Ordering::SeqCst)
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(ProviderError::InvalidAddress(format!("{} rejects it", self.name)));
        }
        if self.failing.load(Ordering::SeqCst) {
            Err(ProviderError::Connection(format!("{} is down", self.name)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainDataProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        self.available.load(Ordering::SeqCst)
    }

    async fn get_wallet_info(&self, _address: &str) -> Result<WalletInfo, ProviderError> {
        self.wallet_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check_failure()?;
        Ok(self.wallet.clone())
    }

    async fn get_tokens_created(
        &self,
        _address: &str,
        _force_refresh: bool,
        manual_tokens: Option<&[String]>,
    ) -> Result<Vec<TokenSummary>, ProviderError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_manual.lock().unwrap() = manual_tokens.map(|tokens| tokens.to_vec());
        self.pause().await;
        self.check_failure()?;
        Ok(self.tokens.clone())
    }

    fn rate_limit(&self) -> RateLimitInfo {
        RateLimitInfo {
            remaining: 100,
            reset_at: Utc::now() + chrono::Duration::seconds(60),
            ceiling: 100,
        }
    }
}

pub const EVM_ADDRESS: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";

pub fn wallet(created_at: &str, tx_count: u64) -> WalletInfo {
    WalletInfo {
        created_at: Some(created_at.to_string()),
        tx_count,
        ..WalletInfo::default()
    }
}

pub fn healthy_token(id: &str) -> TokenSummary {
    let mut token = TokenSummary::new(id);
    token.initial_liquidity = Some(60_000.0);
    token.liquidity_locked = Some(true);
    token.holders_after_7_days = Some(300);
    token.dev_sell_ratio = Some(0.05);
    token
}
