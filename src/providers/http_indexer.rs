//! REST indexer provider.
//!
//! Talks to an indexing service that already emits normalised wallet and
//! token-launch facts:
//!
//! - `GET {base}/health`
//! - `GET {base}/v1/{chain}/wallets/{address}`
//! - `GET {base}/v1/{chain}/wallets/{address}/tokens?refresh=&manual=`
//!
//! Every request, health probes included, is paced. Transient faults are
//! retried, and `429` responses honour `Retry-After` by deferring the pacer.

use crate::oracle::types::{OracleConfig, ProviderEndpointConfig};
use crate::providers::{ChainDataProvider, ProviderError, RateLimitInfo, RequestPacer, RetryPolicy};
use crate::types::{Chain, TokenSummary, WalletInfo};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const API_KEY_HEADER: &str = "x-api-key";
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const ERROR_BODY_LIMIT: usize = 200;

/// Token listings come back either bare or wrapped in `{ "tokens": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokensResponse {
    Bare(Vec<TokenSummary>),
    Wrapped { tokens: Vec<TokenSummary> },
}

impl TokensResponse {
    fn into_tokens(self) -> Vec<TokenSummary> {
        match self {
            TokensResponse::Bare(tokens) | TokensResponse::Wrapped { tokens } => tokens,
        }
    }
}

pub struct HttpIndexerProvider {
    name: String,
    chain: Chain,
    base_url: String,
    api_key: Option<String>,
    client: Client,
    pacer: RequestPacer,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl HttpIndexerProvider {
    pub fn new(
        name: impl Into<String>,
        chain: Chain,
        base_url: impl Into<String>,
        api_key: Option<String>,
        pacer: RequestPacer,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        let base_url: String = base_url.into();

        Ok(Self {
            name: name.into(),
            chain,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            pacer,
            retry,
            request_timeout,
        })
    }

    /// Build a provider from an endpoint entry, taking pacing window, retry
    /// and timeout settings from the oracle config.
    pub fn from_config(
        endpoint: &ProviderEndpointConfig,
        config: &OracleConfig,
    ) -> Result<Self, ProviderError> {
        let pacer = RequestPacer::new(
            endpoint.max_requests_per_second,
            endpoint.requests_per_window,
            Duration::from_secs(config.rate_limit_window_secs),
        );

        Self::new(
            endpoint.name.clone(),
            endpoint.chain,
            endpoint.base_url.clone(),
            endpoint.api_key.clone(),
            pacer,
            config.retry_policy(),
            config.provider_timeout(),
        )
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    fn validate_address(&self, address: &str) -> Result<String, ProviderError> {
        self.chain
            .validate_address(address)
            .ok_or_else(|| ProviderError::InvalidAddress(address.to_string()))
    }

    fn wallet_url(&self, address: &str) -> String {
        format!("{}/v1/{}/wallets/{}", self.base_url, self.chain, address)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        self.retry.run(move || async move { self.send_once(url, query).await }).await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        self.pacer.acquire().await;

        let mut request = self.client.get(url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.request_timeout)
            } else {
                ProviderError::from(e)
            }
        })?;

        self.pacer.ingest_headers(response.headers());
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            if let Some(delay) = retry_after {
                self.pacer.defer(delay);
            }
            warn!(provider = %self.name, ?retry_after, "Upstream rate limit hit");
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChainDataProvider for HttpIndexerProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        // Paced like any other request.
        self.pacer.acquire().await;

        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(HEALTH_PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(provider = %self.name, "Health probe failed: {}", e);
                false
            }
        }
    }

    #[instrument(skip(self), fields(provider = %self.name, chain = %self.chain))]
    async fn get_wallet_info(&self, address: &str) -> Result<WalletInfo, ProviderError> {
        let address = self.validate_address(address)?;
        let url = self.wallet_url(&address);

        let wallet: WalletInfo = self.get_json(&url, &[]).await?;
        debug!(tx_count = wallet.tx_count, "Fetched wallet info");
        Ok(wallet)
    }

    #[instrument(skip(self, manual_tokens), fields(provider = %self.name, chain = %self.chain))]
    async fn get_tokens_created(
        &self,
        address: &str,
        force_refresh: bool,
        manual_tokens: Option<&[String]>,
    ) -> Result<Vec<TokenSummary>, ProviderError> {
        let address = self.validate_address(address)?;
        let url = format!("{}/tokens", self.wallet_url(&address));

        let mut query = vec![("refresh", force_refresh.to_string())];
        let manual = manual_tokens.unwrap_or_default();
        if !manual.is_empty() {
            query.push(("manual", manual.join(",")));
        }

        let response: TokensResponse = self.get_json(&url, &query).await?;
        let mut tokens = response.into_tokens();

        for token in manual {
            if !tokens.iter().any(|known| known.token.eq_ignore_ascii_case(token)) {
                let mut summary = TokenSummary::new(token.clone());
                summary.creator = Some(address.clone());
                tokens.push(summary);
            }
        }

        debug!(count = tokens.len(), "Fetched created tokens");
        Ok(tokens)
    }

    fn rate_limit(&self) -> RateLimitInfo {
        self.pacer.rate_limit()
    }
}
