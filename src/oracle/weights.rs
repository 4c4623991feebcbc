//! Weight schemes for the composite score.
//!
//! The scheme is chosen from data availability, never passed in. Weights are
//! whole percentages so each scheme sums to exactly one and the weighted sum
//! stays in integer arithmetic.

use crate::types::TokenSummary;
use serde::Serialize;
use std::fmt;

/// What token data the composite scorer has to work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataAvailability {
    NoTokens,
    TokensWithoutMetrics,
    TokensWithMetrics,
}

impl DataAvailability {
    pub fn assess(tokens: &[TokenSummary]) -> Self {
        if tokens.is_empty() {
            DataAvailability::NoTokens
        } else if tokens.iter().any(TokenSummary::has_metrics) {
            DataAvailability::TokensWithMetrics
        } else {
            DataAvailability::TokensWithoutMetrics
        }
    }
}

impl fmt::Display for DataAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DataAvailability::NoTokens => "no tokens",
            DataAvailability::TokensWithoutMetrics => "tokens without metrics",
            DataAvailability::TokensWithMetrics => "tokens with metrics",
        };
        f.write_str(label)
    }
}

/// Component weights in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightScheme {
    pub wallet_age: u32,
    pub activity: u32,
    pub token_outcome: u32,
    pub heuristics: u32,
}

impl WeightScheme {
    pub const NO_TOKENS: WeightScheme = WeightScheme {
        wallet_age: 60,
        activity: 40,
        token_outcome: 0,
        heuristics: 0,
    };

    pub const TOKENS_WITHOUT_METRICS: WeightScheme = WeightScheme {
        wallet_age: 50,
        activity: 30,
        token_outcome: 10,
        heuristics: 10,
    };

    pub const TOKENS_WITH_METRICS: WeightScheme = WeightScheme {
        wallet_age: 20,
        activity: 10,
        token_outcome: 35,
        heuristics: 35,
    };

    pub fn for_availability(availability: DataAvailability) -> Self {
        match availability {
            DataAvailability::NoTokens => Self::NO_TOKENS,
            DataAvailability::TokensWithoutMetrics => Self::TOKENS_WITHOUT_METRICS,
            DataAvailability::TokensWithMetrics => Self::TOKENS_WITH_METRICS,
        }
    }

    pub fn for_tokens(tokens: &[TokenSummary]) -> Self {
        Self::for_availability(DataAvailability::assess(tokens))
    }

    pub fn total_percent(&self) -> u32 {
        self.wallet_age + self.activity + self.token_outcome + self.heuristics
    }

    pub fn is_normalized(&self) -> bool {
        self.total_percent() == 100
    }

    /// Weights as fractions, in component order.
    pub fn as_fractions(&self) -> [f64; 4] {
        [
            self.wallet_age as f64 / 100.0,
            self.activity as f64 / 100.0,
            self.token_outcome as f64 / 100.0,
            self.heuristics as f64 / 100.0,
        ]
    }

    /// `round(Σ score × weight)`, clamped to [0,100]. Halves round up.
    pub fn combine(&self, wallet_age: u8, activity: u8, token_outcome: u8, heuristics: u8) -> u8 {
        let weighted = wallet_age as u32 * self.wallet_age
            + activity as u32 * self.activity
            + token_outcome as u32 * self.token_outcome
            + heuristics as u32 * self.heuristics;

        ((weighted + 50) / 100).min(100) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_scheme_sums_to_one() {
        for scheme in [
            WeightScheme::NO_TOKENS,
            WeightScheme::TOKENS_WITHOUT_METRICS,
            WeightScheme::TOKENS_WITH_METRICS,
        ] {
            assert!(scheme.is_normalized());
            let sum: f64 = scheme.as_fractions().iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_scheme_selection() {
        assert_eq!(WeightScheme::for_tokens(&[]), WeightScheme::NO_TOKENS);

        let bare = vec![TokenSummary::new("0xa")];
        assert_eq!(
            DataAvailability::assess(&bare),
            DataAvailability::TokensWithoutMetrics
        );

        let mut with_metric = TokenSummary::new("0xb");
        with_metric.liquidity_locked = Some(false);
        let mixed = vec![TokenSummary::new("0xa"), with_metric];
        assert_eq!(WeightScheme::for_tokens(&mixed), WeightScheme::TOKENS_WITH_METRICS);
    }

    #[test]
    fn test_combine() {
        assert_eq!(WeightScheme::NO_TOKENS.combine(100, 80, 0, 0), 92);
        assert_eq!(WeightScheme::TOKENS_WITH_METRICS.combine(100, 100, 100, 100), 100);
        assert_eq!(WeightScheme::TOKENS_WITH_METRICS.combine(0, 0, 10, 10), 7);
        // 10×0.5 + 0×0.3 + 75×0.1 + 50×0.1 = 17.5
        assert_eq!(WeightScheme::TOKENS_WITHOUT_METRICS.combine(10, 0, 75, 50), 18);
    }
}
