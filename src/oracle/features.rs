//! Component scorers.
//!
//! Four independent scorers, each producing an integer in [0,100] together
//! with the notes that explain it. None of them fail on missing data; every
//! "no data" case has a fixed neutral score.

use crate::types::{Outcome, TokenSummary, WalletInfo, HEURISTIC_METRIC_COUNT};
use chrono::{DateTime, Utc};

/// Score for an unknown or unparseable wallet age.
pub const NEUTRAL_AGE_SCORE: u8 = 50;
/// Token-outcome score when the wallet created no tokens.
pub const NO_TOKENS_OUTCOME_SCORE: u8 = 75;
/// Heuristics score when no token carries any metric.
pub const NO_METRICS_HEURISTICS_SCORE: u8 = 50;

const MIN_BOUNDED_SCORE: i32 = 10;
const MAX_SCORE: i32 = 100;

/// A sub-score and the notes that explain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentScore {
    pub score: u8,
    pub notes: Vec<String>,
}

impl ComponentScore {
    fn new(score: u8, note: String) -> Self {
        Self {
            score,
            notes: vec![note],
        }
    }
}

pub fn age_bucket_score(days: i64) -> u8 {
    match days {
        d if d >= 365 => 100,
        d if d >= 90 => 80,
        d if d >= 30 => 60,
        d if d >= 7 => 40,
        _ => 10,
    }
}

pub fn wallet_age_score(wallet: &WalletInfo, now: DateTime<Utc>) -> ComponentScore {
    match wallet.age_in_days(now) {
        Some(days) => {
            let score = age_bucket_score(days);
            let age = wallet
                .age
                .clone()
                .unwrap_or_else(|| crate::types::describe_age(days));
            let verdict = match score {
                100 => "established wallet",
                80 => "mature wallet",
                60 => "moderately new wallet",
                40 => "new wallet",
                _ => "very new wallet",
            };
            ComponentScore::new(score, format!("Wallet age: {} ({})", age, verdict))
        }
        None => ComponentScore::new(
            NEUTRAL_AGE_SCORE,
            "Wallet age unknown, using neutral score".to_string(),
        ),
    }
}

pub fn activity_bucket_score(tx_count: u64) -> u8 {
    match tx_count {
        n if n >= 1000 => 100,
        n if n >= 500 => 80,
        n if n >= 100 => 60,
        n if n >= 50 => 40,
        n if n >= 10 => 20,
        _ => 0,
    }
}

pub fn activity_score(wallet: &WalletInfo) -> ComponentScore {
    let score = activity_bucket_score(wallet.tx_count);
    let level = match score {
        100 => "very high activity",
        80 => "high activity",
        60 => "moderate activity",
        40 => "low activity",
        20 => "minimal activity",
        _ => "almost no activity",
    };
    ComponentScore::new(
        score,
        format!("Transaction count: {} ({})", wallet.tx_count, level),
    )
}

/// Counts of outcomes across a token list. Unlabelled tokens count as unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub success: usize,
    pub rug: usize,
    pub unknown: usize,
}

impl OutcomeCounts {
    pub fn tally(tokens: &[TokenSummary]) -> Self {
        tokens.iter().fold(Self::default(), |mut counts, token| {
            match token.outcome.unwrap_or(Outcome::Unknown) {
                Outcome::Success => counts.success += 1,
                Outcome::Rug => counts.rug += 1,
                Outcome::Unknown => counts.unknown += 1,
            }
            counts
        })
    }

    pub fn total(&self) -> usize {
        self.success + self.rug + self.unknown
    }
}

pub fn token_outcome_score(tokens: &[TokenSummary]) -> ComponentScore {
    if tokens.is_empty() {
        return ComponentScore::new(
            NO_TOKENS_OUTCOME_SCORE,
            "No tokens created by this wallet".to_string(),
        );
    }

    let counts = OutcomeCounts::tally(tokens);
    let total = counts.total() as f64;
    let success_ratio = counts.success as f64 / total;
    let rug_ratio = counts.rug as f64 / total;

    let raw = (100.0 * (0.5 * success_ratio + 0.5 * (1.0 - rug_ratio))).round() as i32;
    let score = raw.clamp(MIN_BOUNDED_SCORE, MAX_SCORE) as u8;

    let mut notes = vec![format!(
        "Created {} {}: {} successful, {} rugged, {} unknown",
        tokens.len(),
        plural(tokens.len(), "token"),
        counts.success,
        counts.rug,
        counts.unknown
    )];
    if counts.rug > 0 {
        notes.push(format!(
            "RUG PULL FLAG: {} {} flagged as likely rug {}",
            counts.rug,
            plural(counts.rug, "token"),
            plural(counts.rug, "pull")
        ));
    }

    ComponentScore { score, notes }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Critical,
    Warning,
    Positive,
}

#[derive(Default)]
struct HeuristicNotes {
    critical: Vec<String>,
    warning: Vec<String>,
    positive: Vec<String>,
    penalty: i32,
}

impl HeuristicNotes {
    fn apply(&mut self, severity: Severity, penalty: i32, note: String) {
        self.penalty += penalty;
        match severity {
            Severity::Critical => self.critical.push(note),
            Severity::Warning => self.warning.push(note),
            Severity::Positive => self.positive.push(note),
        }
    }
}

/// Outcome of the heuristics scorer: the score plus the data-point counts the
/// composite scorer reuses for confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicsAssessment {
    pub score: u8,
    pub notes: Vec<String>,
    pub available_data_points: usize,
    pub expected_data_points: usize,
}

impl HeuristicsAssessment {
    /// Fraction of expected metric slots that were populated; 0 without tokens.
    pub fn completeness(&self) -> f64 {
        if self.expected_data_points == 0 {
            0.0
        } else {
            self.available_data_points as f64 / self.expected_data_points as f64
        }
    }
}

pub fn heuristics_score(tokens: &[TokenSummary]) -> HeuristicsAssessment {
    let expected_data_points = tokens.len() * HEURISTIC_METRIC_COUNT;
    let available_data_points: usize = tokens.iter().map(TokenSummary::metrics_present).sum();

    if available_data_points == 0 {
        return HeuristicsAssessment {
            score: NO_METRICS_HEURISTICS_SCORE,
            notes: vec!["No token metrics available for heuristic analysis".to_string()],
            available_data_points,
            expected_data_points,
        };
    }

    let mut findings = HeuristicNotes::default();
    let mut missing = Vec::new();

    for token in tokens {
        if !token.has_metrics() {
            missing.push(token.label().to_string());
            continue;
        }
        assess_token(token, &mut findings);
    }

    let score = (MAX_SCORE - findings.penalty).clamp(MIN_BOUNDED_SCORE, MAX_SCORE) as u8;

    let risk_level = if !findings.critical.is_empty() {
        "HIGH"
    } else if findings.warning.len() > 2 {
        "MODERATE"
    } else {
        "LOW"
    };

    let mut notes = Vec::new();
    notes.extend(findings.critical.into_iter().map(|n| format!("CRITICAL: {}", n)));
    notes.extend(findings.warning.into_iter().map(|n| format!("WARNING: {}", n)));
    notes.extend(findings.positive.into_iter().map(|n| format!("POSITIVE: {}", n)));
    if !missing.is_empty() {
        notes.push(format!(
            "INFO: {} {} without heuristic metrics ({})",
            missing.len(),
            plural(missing.len(), "token"),
            missing.join(", ")
        ));
    }
    notes.push(format!(
        "Heuristic risk level: {} ({}/{} data points available)",
        risk_level, available_data_points, expected_data_points
    ));

    HeuristicsAssessment {
        score,
        notes,
        available_data_points,
        expected_data_points,
    }
}

fn assess_token(token: &TokenSummary, findings: &mut HeuristicNotes) {
    let label = token.label();

    if let Some(ratio) = token.dev_sell_ratio {
        let pct = ratio * 100.0;
        match ratio {
            r if r >= 0.8 => findings.apply(
                Severity::Critical,
                60,
                format!("{}: developer sold {:.0}% of supply", label, pct),
            ),
            r if r >= 0.5 => findings.apply(
                Severity::Warning,
                35,
                format!("{}: developer sold {:.0}% of supply", label, pct),
            ),
            r if r >= 0.25 => findings.apply(
                Severity::Warning,
                15,
                format!("{}: developer sold {:.0}% of supply", label, pct),
            ),
            r if r < 0.1 => findings.apply(
                Severity::Positive,
                -5,
                format!("{}: developer kept most of supply ({:.0}% sold)", label, pct),
            ),
            _ => {}
        }
    }

    if let Some(liquidity) = token.initial_liquidity {
        match liquidity {
            l if l <= 0.0 => findings.apply(
                Severity::Critical,
                40,
                format!("{}: no initial liquidity", label),
            ),
            l if l < 1_000.0 => findings.apply(
                Severity::Warning,
                25,
                format!("{}: very low initial liquidity ({:.0})", label, l),
            ),
            l if l < 10_000.0 => findings.apply(
                Severity::Warning,
                10,
                format!("{}: low initial liquidity ({:.0})", label, l),
            ),
            l if l >= 50_000.0 => findings.apply(
                Severity::Positive,
                -10,
                format!("{}: strong initial liquidity ({:.0})", label, l),
            ),
            _ => {}
        }
    }

    match token.liquidity_locked {
        Some(true) => findings.apply(
            Severity::Positive,
            -20,
            format!("{}: liquidity locked", label),
        ),
        Some(false) => findings.apply(
            Severity::Warning,
            15,
            format!("{}: liquidity not locked", label),
        ),
        None => {}
    }

    if let Some(holders) = token.holders_after_7_days {
        match holders {
            h if h < 10 => findings.apply(
                Severity::Warning,
                20,
                format!("{}: only {} holders after 7 days", label, h),
            ),
            h if h < 50 => findings.apply(
                Severity::Warning,
                10,
                format!("{}: {} holders after 7 days", label, h),
            ),
            h if h >= 100 => findings.apply(
                Severity::Positive,
                -10,
                format!("{}: {} holders after 7 days", label, h),
            ),
            _ => {}
        }
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_timestamp;

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-07-05T00:00:00Z").unwrap()
    }

    fn wallet_aged(days: i64) -> WalletInfo {
        let created = now() - chrono::Duration::days(days);
        WalletInfo {
            created_at: Some(created.to_rfc3339()),
            ..WalletInfo::default()
        }
    }

    fn with_outcome(outcome: Outcome) -> TokenSummary {
        let mut token = TokenSummary::new("0xt");
        token.outcome = Some(outcome);
        token
    }

    #[test]
    fn test_wallet_age_boundaries() {
        let days = [0, 6, 7, 29, 30, 89, 90, 364, 365];
        let expected = [10, 10, 40, 40, 60, 60, 80, 80, 100];
        for (d, e) in days.iter().zip(expected.iter()) {
            assert_eq!(wallet_age_score(&wallet_aged(*d), now()).score, *e, "{} days", d);
        }
    }

    #[test]
    fn test_wallet_age_unknown_is_neutral() {
        let result = wallet_age_score(&WalletInfo::unknown(), now());
        assert_eq!(result.score, 50);
        assert_eq!(result.notes.len(), 1);

        let garbage = WalletInfo {
            created_at: Some("yesterday-ish".to_string()),
            ..WalletInfo::default()
        };
        assert_eq!(wallet_age_score(&garbage, now()).score, 50);
    }

    #[test]
    fn test_activity_boundaries() {
        let counts = [9, 10, 49, 50, 99, 100, 499, 500, 999, 1000];
        let expected = [0, 20, 20, 40, 40, 60, 60, 80, 80, 100];
        for (c, e) in counts.iter().zip(expected.iter()) {
            assert_eq!(activity_bucket_score(*c), *e, "{} txs", c);
        }
    }

    #[test]
    fn test_token_outcome_mixed() {
        let tokens = vec![
            with_outcome(Outcome::Success),
            with_outcome(Outcome::Success),
            with_outcome(Outcome::Rug),
            with_outcome(Outcome::Unknown),
        ];
        let result = token_outcome_score(&tokens);
        assert_eq!(result.score, 63);
        assert!(result.notes[1].contains("1 token flagged"));
    }

    #[test]
    fn test_token_outcome_edge_cases() {
        assert_eq!(token_outcome_score(&[]).score, 75);

        let unknown = vec![with_outcome(Outcome::Unknown); 3];
        assert_eq!(token_outcome_score(&unknown).score, 50);

        let all_rugs = vec![with_outcome(Outcome::Rug); 2];
        let result = token_outcome_score(&all_rugs);
        assert_eq!(result.score, 10);
        assert_eq!(result.notes.len(), 2);

        let all_success = vec![with_outcome(Outcome::Success); 2];
        assert_eq!(token_outcome_score(&all_success).score, 100);
    }

    #[test]
    fn test_heuristics_critical_floor() {
        let mut token = TokenSummary::new("0xt");
        token.dev_sell_ratio = Some(0.8);
        token.initial_liquidity = Some(0.0);

        let result = heuristics_score(&[token]);
        assert_eq!(result.score, 10);
        assert_eq!(result.available_data_points, 2);
        assert_eq!(result.expected_data_points, 4);
        assert!(result.notes[0].starts_with("CRITICAL"));
        assert_eq!(
            result.notes.last().unwrap(),
            "Heuristic risk level: HIGH (2/4 data points available)"
        );
    }

    #[test]
    fn test_heuristics_bonuses_cap_at_hundred() {
        let mut token = TokenSummary::new("0xt");
        token.dev_sell_ratio = Some(0.0);
        token.initial_liquidity = Some(100_000.0);
        token.liquidity_locked = Some(true);
        token.holders_after_7_days = Some(500);

        let result = heuristics_score(&[token]);
        assert_eq!(result.score, 100);
        assert_eq!(result.notes.len(), 5);
        assert!(result.notes[..4].iter().all(|n| n.starts_with("POSITIVE")));
        assert!(result.notes[4].contains("LOW"));
    }

    #[test]
    fn test_heuristics_moderate_and_missing_tokens() {
        let mut risky = TokenSummary::new("0xa");
        risky.symbol = Some("AAA".to_string());
        risky.dev_sell_ratio = Some(0.3);
        risky.initial_liquidity = Some(500.0);
        risky.liquidity_locked = Some(false);

        let mut bare = TokenSummary::new("0xb");
        bare.symbol = Some("BBB".to_string());

        let result = heuristics_score(&[risky, bare]);
        // 15 + 25 + 15
        assert_eq!(result.score, 45);
        assert!(result
            .notes
            .iter()
            .any(|n| n == "INFO: 1 token without heuristic metrics (BBB)"));
        assert_eq!(
            result.notes.last().unwrap(),
            "Heuristic risk level: MODERATE (3/8 data points available)"
        );
    }

    #[test]
    fn test_heuristics_without_metrics() {
        let tokens = vec![TokenSummary::new("0xa"), TokenSummary::new("0xb")];
        let result = heuristics_score(&tokens);
        assert_eq!(result.score, 50);
        assert_eq!(result.notes.len(), 1);
        assert_eq!(result.completeness(), 0.0);

        assert_eq!(heuristics_score(&[]).score, 50);
    }
}
