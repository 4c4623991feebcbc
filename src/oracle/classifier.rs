//! Outcome classification for launched tokens.
//!
//! Ordered rules, first match wins. Pure and total: every token gets exactly
//! one outcome and a reason.

use crate::types::{Outcome, TokenSummary};

/// Dev-sell ratio above which a token with no liquidity is a rug.
pub const RUG_DEV_SELL_RATIO: f64 = 0.8;
/// Dev-sell ratio below which a token can count as a success.
pub const SUCCESS_MAX_DEV_SELL_RATIO: f64 = 0.25;
/// Holders after seven days needed for a success.
pub const SUCCESS_MIN_HOLDERS: u64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub outcome: Outcome,
    pub reason: String,
}

pub fn classify(token: &TokenSummary) -> Classification {
    let no_liquidity = token.initial_liquidity.map_or(true, |liquidity| liquidity <= 0.0);

    if let Some(ratio) = token.dev_sell_ratio {
        if ratio > RUG_DEV_SELL_RATIO && no_liquidity {
            return Classification {
                outcome: Outcome::Rug,
                reason: format!(
                    "Developer sold {:.0}% of supply with no liquidity",
                    ratio * 100.0
                ),
            };
        }
    }

    if let (Some(true), Some(holders), Some(ratio)) = (
        token.liquidity_locked,
        token.holders_after_7_days,
        token.dev_sell_ratio,
    ) {
        if holders >= SUCCESS_MIN_HOLDERS && ratio < SUCCESS_MAX_DEV_SELL_RATIO {
            return Classification {
                outcome: Outcome::Success,
                reason: format!(
                    "Locked liquidity, {} holders after 7 days, developer sold {:.0}%",
                    holders,
                    ratio * 100.0
                ),
            };
        }
    }

    let reason = if token.has_metrics() {
        "Insufficient or mixed signals"
    } else {
        "No heuristic metrics available"
    };

    Classification {
        outcome: Outcome::Unknown,
        reason: reason.to_string(),
    }
}

/// Classify every token that has no outcome yet. Existing outcomes are kept.
pub fn label_tokens(tokens: &mut [TokenSummary]) {
    for token in tokens.iter_mut().filter(|token| token.outcome.is_none()) {
        let Classification { outcome, reason } = classify(token);
        token.outcome = Some(outcome);
        if token.reason.is_none() {
            token.reason = Some(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> TokenSummary {
        TokenSummary::new("0xtoken")
    }

    #[test]
    fn test_rug_requires_high_sell_and_no_liquidity() {
        let mut t = token();
        t.dev_sell_ratio = Some(0.9);
        assert_eq!(classify(&t).outcome, Outcome::Rug);

        t.initial_liquidity = Some(0.0);
        assert_eq!(classify(&t).outcome, Outcome::Rug);

        t.initial_liquidity = Some(5_000.0);
        assert_eq!(classify(&t).outcome, Outcome::Unknown);
    }

    #[test]
    fn test_rug_threshold_is_strict() {
        let mut t = token();
        t.dev_sell_ratio = Some(0.8);
        t.initial_liquidity = Some(0.0);
        assert_eq!(classify(&t).outcome, Outcome::Unknown);
    }

    #[test]
    fn test_success_needs_all_positive_signals() {
        let mut t = token();
        t.liquidity_locked = Some(true);
        t.holders_after_7_days = Some(150);
        t.dev_sell_ratio = Some(0.05);
        let result = classify(&t);
        assert_eq!(result.outcome, Outcome::Success);
        assert!(result.reason.contains("150 holders"));

        t.dev_sell_ratio = None;
        assert_eq!(classify(&t).outcome, Outcome::Unknown);

        t.dev_sell_ratio = Some(0.05);
        t.holders_after_7_days = Some(99);
        assert_eq!(classify(&t).outcome, Outcome::Unknown);
    }

    #[test]
    fn test_no_metrics_is_unknown() {
        let result = classify(&token());
        assert_eq!(result.outcome, Outcome::Unknown);
        assert_eq!(result.reason, "No heuristic metrics available");
    }

    #[test]
    fn test_label_tokens_keeps_existing_outcomes() {
        let mut preset = token();
        preset.outcome = Some(Outcome::Success);
        preset.reason = Some("verified by indexer".to_string());
        preset.dev_sell_ratio = Some(0.95);

        let mut fresh = token();
        fresh.dev_sell_ratio = Some(0.95);

        let mut tokens = vec![preset, fresh];
        label_tokens(&mut tokens);

        assert_eq!(tokens[0].outcome, Some(Outcome::Success));
        assert_eq!(tokens[0].reason.as_deref(), Some("verified by indexer"));
        assert_eq!(tokens[1].outcome, Some(Outcome::Rug));
        assert!(tokens[1].reason.is_some());
    }
}
