//! Core types and data structures shared by providers and the scoring engine.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of heuristic metrics a token launch can carry.
pub const HEURISTIC_METRIC_COUNT: usize = 4;

/// Supported blockchain networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Base,
    Bsc,
    Polygon,
    Arbitrum,
    Solana,
}

impl Chain {
    /// Returns the canonical identifier used in config, URLs and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Base => "base",
            Chain::Bsc => "bsc",
            Chain::Polygon => "polygon",
            Chain::Arbitrum => "arbitrum",
            Chain::Solana => "solana",
        }
    }

    /// Returns all supported chains.
    pub fn all() -> Vec<Chain> {
        vec![
            Chain::Ethereum,
            Chain::Base,
            Chain::Bsc,
            Chain::Polygon,
            Chain::Arbitrum,
            Chain::Solana,
        ]
    }

    /// Account-based EVM chains share the hex address format.
    pub fn is_evm(&self) -> bool {
        !matches!(self, Chain::Solana)
    }

    /// Light normalisation of a caller-supplied address.
    ///
    /// Full format validation belongs to the chain-specific providers; this only
    /// rejects input that can never be an address and lower-cases hex addresses
    /// so that cache keys are stable.
    pub fn normalize_address(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(|c| c.is_whitespace() || c == '/') {
            return None;
        }

        if self.is_evm() {
            Some(trimmed.to_lowercase())
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Normalise and check the chain's address format: `0x` plus 40 hex
    /// digits on EVM chains, 32-44 base58 characters on Solana.
    pub fn validate_address(&self, raw: &str) -> Option<String> {
        let normalized = self.normalize_address(raw)?;

        let valid = if self.is_evm() {
            normalized.len() == 42
                && normalized.starts_with("0x")
                && normalized[2..].chars().all(|c| c.is_ascii_hexdigit())
        } else {
            (32..=44).contains(&normalized.len()) && normalized.chars().all(is_base58_char)
        };

        valid.then_some(normalized)
    }
}

fn is_base58_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" | "mainnet" => Ok(Chain::Ethereum),
            "base" => Ok(Chain::Base),
            "bsc" | "bnb" | "binance" => Ok(Chain::Bsc),
            "polygon" | "matic" => Ok(Chain::Polygon),
            "arbitrum" | "arb" => Ok(Chain::Arbitrum),
            "solana" | "sol" => Ok(Chain::Solana),
            other => Err(format!("unsupported chain: {}", other)),
        }
    }
}

/// Classification assigned to a single token launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Rug,
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Rug => "rug",
            Outcome::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wallet facts reported by a chain-data provider.
///
/// Absent fields mean the provider could not determine the value, never zero.
/// `created_at` is kept exactly as the provider reported it and parsed at
/// scoring time, so an unparseable value degrades to the neutral age score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_tx_hash: Option<String>,
    #[serde(default)]
    pub tx_count: u64,
    #[serde(default)]
    pub age: Option<String>,
}

impl WalletInfo {
    /// The benign value returned when no provider could answer.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Build wallet facts, deriving the descriptive age from `created_at`.
    pub fn new(
        created_at: Option<String>,
        first_tx_hash: Option<String>,
        tx_count: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            created_at,
            first_tx_hash,
            tx_count,
            age: None,
        }
        .with_derived_age(now)
    }

    /// Parsed first-activity timestamp, if the raw value is understood.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// Whole days elapsed since first activity. `None` when unknown,
    /// unparseable, or reported in the future.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> Option<i64> {
        let created = self.created_at_utc()?;
        let days = (now - created).num_days();
        if created > now {
            None
        } else {
            Some(days)
        }
    }

    /// Fill in `age` when the provider left it out.
    pub fn with_derived_age(mut self, now: DateTime<Utc>) -> Self {
        if self.age.is_none() {
            self.age = self.age_in_days(now).map(describe_age);
        }
        self
    }
}

/// Facts about one token launched by the wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_at: Option<String>,

    #[serde(default)]
    pub initial_liquidity: Option<f64>,
    #[serde(default, rename = "holdersAfter7Days")]
    pub holders_after_7_days: Option<u64>,
    #[serde(default)]
    pub liquidity_locked: Option<bool>,
    #[serde(default)]
    pub dev_sell_ratio: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TokenSummary {
    /// A token with no metadata and no metrics.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// How many of the four heuristic metrics are present.
    pub fn metrics_present(&self) -> usize {
        [
            self.initial_liquidity.is_some(),
            self.holders_after_7_days.is_some(),
            self.liquidity_locked.is_some(),
            self.dev_sell_ratio.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    pub fn has_metrics(&self) -> bool {
        self.metrics_present() > 0
    }

    /// Short label for notes: symbol when known, otherwise the identifier.
    pub fn label(&self) -> &str {
        self.symbol.as_deref().unwrap_or(&self.token)
    }
}

/// Parse the timestamp formats providers are known to emit:
/// RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, unix seconds or millis.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    if let Ok(epoch) = raw.parse::<i64>() {
        // Anything past year ~33658 in seconds is really milliseconds.
        return if epoch.abs() >= 1_000_000_000_000 {
            Utc.timestamp_millis_opt(epoch).single()
        } else {
            Utc.timestamp_opt(epoch, 0).single()
        };
    }

    None
}

/// Human-readable wallet age, e.g. "1 year, 35 days".
pub fn describe_age(days: i64) -> String {
    if days < 1 {
        return "less than a day".to_string();
    }

    let years = days / 365;
    let rest = days % 365;
    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    match (years, rest) {
        (0, d) => plural(d, "day"),
        (y, 0) => plural(y, "year"),
        (y, d) => format!("{}, {}", plural(y, "year"), plural(d, "day")),
    }
}
