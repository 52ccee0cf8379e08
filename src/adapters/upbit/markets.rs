//! Upbit KRW market discovery
//!
//! The symbol universe can be seeded from every KRW market Upbit lists.

use tracing::info;

use crate::adapters::errors::{ExchangeError, ExchangeResult};

use super::types::UpbitMarket;

const KRW_PREFIX: &str = "KRW-";

/// Fetch all KRW markets as canonical symbols, sorted and deduplicated
pub async fn fetch_krw_markets(
    client: &reqwest::Client,
    rest_url: &str,
) -> ExchangeResult<Vec<String>> {
    let url = format!("{}/v1/market/all", rest_url.trim_end_matches('/'));
    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(ExchangeError::InvalidResponse(format!(
            "market list returned {}",
            response.status()
        )));
    }

    let markets: Vec<UpbitMarket> = response.json().await?;
    let symbols = krw_symbols(&markets);
    info!(exchange = "upbit", markets = symbols.len(), "KRW markets loaded");
    Ok(symbols)
}

fn krw_symbols(markets: &[UpbitMarket]) -> Vec<String> {
    let mut symbols: Vec<String> = markets
        .iter()
        .filter_map(|m| m.market.strip_prefix(KRW_PREFIX))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();
    symbols.sort();
    symbols.dedup();
    symbols
}
