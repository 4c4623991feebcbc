//! Wallet trust oracle demo binary.
//!
//! Usage: `wallet-trust-oracle <address> [chain] [--refresh] [--manual tok1,tok2]`
//!
//! Providers come from `TRUST_PROVIDERS` (JSON array of endpoint configs);
//! other `TRUST_*` variables override the defaults. Prints the trust report
//! as JSON.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wallet_trust_oracle::{Chain, OracleBuilder, OracleConfig};

struct Args {
    address: String,
    chain: Chain,
    force_refresh: bool,
    manual_tokens: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut positional = Vec::new();
    let mut force_refresh = false;
    let mut manual_tokens = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--refresh" => force_refresh = true,
            "--manual" => {
                let list = args.next().context("--manual needs a comma-separated token list")?;
                manual_tokens.extend(
                    list.split(',')
                        .map(str::trim)
                        .filter(|token| !token.is_empty())
                        .map(String::from),
                );
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(address) = positional.next() else {
        bail!("usage: wallet-trust-oracle <address> [chain] [--refresh] [--manual tok1,tok2]");
    };
    let chain = match positional.next() {
        Some(raw) => raw.parse::<Chain>().map_err(anyhow::Error::msg)?,
        None => Chain::Ethereum,
    };

    Ok(Args {
        address,
        chain,
        force_refresh,
        manual_tokens,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = OracleConfig::from_env().context("Failed to load oracle configuration")?;
    if config.providers.is_empty() {
        warn!("TRUST_PROVIDERS is empty; no chain has a provider configured");
    }

    let oracle = OracleBuilder::new()
        .with_config(config)
        .build()
        .context("Failed to build trust oracle")?;
    oracle.start_health_checks();

    info!("Analysing {} on {}", args.address, args.chain);
    let manual = (!args.manual_tokens.is_empty()).then_some(args.manual_tokens.as_slice());
    let report = oracle
        .analyze(&args.address, args.chain, args.force_refresh, manual)
        .await
        .context("Analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    oracle.stop_health_checks();
    Ok(())
}
