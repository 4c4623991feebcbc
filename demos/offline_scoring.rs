//! Scores a few hand-written wallets without touching the network.
//!
//! Run with `cargo run --example offline_scoring`.

use anyhow::Result;
use chrono::{Duration, Utc};
use wallet_trust_oracle::{compute_score_at, TokenSummary, WalletInfo};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let now = Utc::now();

    let veteran = WalletInfo::new(
        Some((now - Duration::days(400)).to_rfc3339()),
        None,
        500,
        now,
    );

    let mut careful_launch = TokenSummary::new("0x1111111111111111111111111111111111111111");
    careful_launch.symbol = Some("SAFE".to_string());
    careful_launch.initial_liquidity = Some(75_000.0);
    careful_launch.liquidity_locked = Some(true);
    careful_launch.holders_after_7_days = Some(420);
    careful_launch.dev_sell_ratio = Some(0.02);

    let mut dumped_launch = TokenSummary::new("0x2222222222222222222222222222222222222222");
    dumped_launch.symbol = Some("RUG".to_string());
    dumped_launch.initial_liquidity = Some(0.0);
    dumped_launch.dev_sell_ratio = Some(0.97);

    let fresh = WalletInfo::new(Some((now - Duration::days(3)).to_rfc3339()), None, 12, now);

    let cases = [
        ("veteran, no launches", veteran.clone(), Vec::new()),
        ("veteran, clean launch", veteran, vec![careful_launch.clone()]),
        ("fresh wallet, mixed launches", fresh, vec![careful_launch, dumped_launch]),
    ];

    for (label, wallet, tokens) in cases {
        let result = compute_score_at(&wallet, &tokens, now);
        println!("== {} ==", label);
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
