//! Composite scorer.
//!
//! Pure, no I/O. Labels any unclassified tokens, runs the four component
//! scorers, picks the weight scheme from data availability, and derives the
//! confidence from heuristic data completeness.
//!
//! Notes order is fixed: wallet age, activity, token outcomes (with the rug
//! flag), the heuristics block when tokens exist, then one confidence note.

use crate::oracle::classifier::label_tokens;
use crate::oracle::features::{
    activity_score, heuristics_score, token_outcome_score, wallet_age_score, HeuristicsAssessment,
};
use crate::oracle::types::{Confidence, ConfidenceLevel, ScoreBreakdown, ScoringResult};
use crate::oracle::weights::{DataAvailability, WeightScheme};
use crate::types::{TokenSummary, WalletInfo};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Score a wallet as of now.
pub fn compute_score(wallet: &WalletInfo, tokens: &[TokenSummary]) -> ScoringResult {
    compute_score_at(wallet, tokens, Utc::now())
}

/// Score a wallet as of `now`. Same inputs and `now` give the same result.
pub fn compute_score_at(
    wallet: &WalletInfo,
    tokens: &[TokenSummary],
    now: DateTime<Utc>,
) -> ScoringResult {
    let mut tokens = tokens.to_vec();
    label_tokens(&mut tokens);

    let wallet_age = wallet_age_score(wallet, now);
    let activity = activity_score(wallet);
    let token_outcome = token_outcome_score(&tokens);
    let heuristics = heuristics_score(&tokens);

    let availability = DataAvailability::assess(&tokens);
    let weights = WeightScheme::for_availability(availability);
    let score = weights.combine(
        wallet_age.score,
        activity.score,
        token_outcome.score,
        heuristics.score,
    );

    let confidence = derive_confidence(availability, &heuristics);

    let mut notes = Vec::new();
    notes.extend(wallet_age.notes);
    notes.extend(activity.notes);
    notes.extend(token_outcome.notes);
    if !tokens.is_empty() {
        notes.extend(heuristics.notes.iter().cloned());
    }
    notes.push(format!("Confidence: {} - {}", confidence.level, confidence.reason));

    debug!(
        score,
        wallet_age = wallet_age.score,
        activity = activity.score,
        token_outcome = token_outcome.score,
        heuristics = heuristics.score,
        scheme = %availability,
        "Computed trust score"
    );

    ScoringResult {
        score,
        breakdown: ScoreBreakdown {
            wallet_age_score: wallet_age.score,
            activity_score: activity.score,
            token_outcome_score: token_outcome.score,
            heuristics_score: heuristics.score,
            final_score: score,
        },
        notes,
        confidence,
    }
}

fn derive_confidence(availability: DataAvailability, heuristics: &HeuristicsAssessment) -> Confidence {
    let completeness = heuristics.completeness();
    let level = ConfidenceLevel::from_completeness(completeness);

    let reason = match availability {
        DataAvailability::NoTokens => {
            "No token launches found; score relies on wallet age and activity only".to_string()
        }
        DataAvailability::TokensWithoutMetrics => format!(
            "None of the {} expected token metrics were available",
            heuristics.expected_data_points
        ),
        DataAvailability::TokensWithMetrics => format!(
            "{} of {} expected token metrics available ({:.0}%)",
            heuristics.available_data_points,
            heuristics.expected_data_points,
            completeness * 100.0
        ),
    };

    Confidence {
        level,
        reason,
        data_completeness: completeness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_timestamp, Outcome};

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-07-05T00:00:00Z").unwrap()
    }

    fn wallet(days_old: i64, tx_count: u64) -> WalletInfo {
        WalletInfo {
            created_at: Some((now() - chrono::Duration::days(days_old)).to_rfc3339()),
            tx_count,
            ..WalletInfo::default()
        }
    }

    #[test]
    fn test_no_tokens_scenario() {
        let result = compute_score_at(&wallet(400, 500), &[], now());

        assert_eq!(result.score, 92);
        assert_eq!(result.breakdown.final_score, 92);
        assert_eq!(result.breakdown.token_outcome_score, 75);
        assert_eq!(result.breakdown.heuristics_score, 50);
        assert_eq!(result.confidence.level, ConfidenceLevel::Low);
        assert_eq!(result.confidence.data_completeness, 0.0);
        // age, activity, token count, confidence
        assert_eq!(result.notes.len(), 4);
        assert!(result.notes[3].starts_with("Confidence: LOW"));
    }

    #[test]
    fn test_unknown_wallet_with_no_tokens() {
        let result = compute_score_at(&WalletInfo::unknown(), &[], now());
        // 50×0.6 + 0×0.4
        assert_eq!(result.score, 30);
        assert_eq!(result.breakdown.wallet_age_score, 50);
        assert_eq!(result.breakdown.activity_score, 0);
    }

    #[test]
    fn test_tokens_are_classified_before_scoring() {
        let mut rug = TokenSummary::new("0xr");
        rug.dev_sell_ratio = Some(0.95);
        rug.initial_liquidity = Some(0.0);

        let result = compute_score_at(&wallet(10, 20), &[rug], now());

        // One rug: round(100 × 0.5 × 0) floored to 10.
        assert_eq!(result.breakdown.token_outcome_score, 10);
        assert_eq!(result.breakdown.heuristics_score, 10);
        // 40×0.2 + 20×0.1 + 10×0.35 + 10×0.35 = 17
        assert_eq!(result.score, 17);
        assert!(result.notes.iter().any(|n| n.starts_with("RUG PULL FLAG: 1 token")));
    }

    #[test]
    fn test_tokens_without_metrics_scheme() {
        let tokens = vec![TokenSummary::new("0xa"), TokenSummary::new("0xb")];
        let result = compute_score_at(&wallet(400, 1000), &tokens, now());

        // 100×0.5 + 100×0.3 + 50×0.1 + 50×0.1
        assert_eq!(result.score, 90);
        assert_eq!(result.confidence.level, ConfidenceLevel::Low);
        assert!(result
            .notes
            .iter()
            .any(|n| n == "No token metrics available for heuristic analysis"));
    }

    #[test]
    fn test_notes_order() {
        let mut token = TokenSummary::new("0xt");
        token.symbol = Some("GOOD".to_string());
        token.dev_sell_ratio = Some(0.05);
        token.initial_liquidity = Some(60_000.0);
        token.liquidity_locked = Some(true);
        token.holders_after_7_days = Some(250);

        let result = compute_score_at(&wallet(100, 120), &[token], now());

        assert!(result.notes[0].starts_with("Wallet age"));
        assert!(result.notes[1].starts_with("Transaction count"));
        assert!(result.notes[2].starts_with("Created 1 token: 1 successful"));
        assert!(result.notes[3].starts_with("POSITIVE"));
        let last = result.notes.last().unwrap();
        assert!(last.starts_with("Confidence: HIGH"));
        assert_eq!(
            result.notes.iter().filter(|n| n.starts_with("Confidence")).count(),
            1
        );
        assert_eq!(result.confidence.data_completeness, 1.0);
    }

    #[test]
    fn test_preclassified_outcome_is_respected() {
        let mut token = TokenSummary::new("0xt");
        token.outcome = Some(Outcome::Success);
        token.dev_sell_ratio = Some(0.95);

        let result = compute_score_at(&wallet(400, 1000), &[token], now());
        // 100 × (0.5 × 1 + 0.5 × 1)
        assert_eq!(result.breakdown.token_outcome_score, 100);
    }

    #[test]
    fn test_score_bounds_hold() {
        let inputs = [
            (wallet(0, 0), Vec::new()),
            (wallet(5000, 100_000), Vec::new()),
            (wallet(1, 1), vec![TokenSummary::new("0xa")]),
        ];
        for (w, tokens) in inputs.iter() {
            let result = compute_score_at(w, tokens, now());
            assert!(result.score <= 100);
            assert_eq!(result.score, result.breakdown.final_score);
            assert!((10..=100).contains(&result.breakdown.heuristics_score));
        }
    }
}
