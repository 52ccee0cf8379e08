//! Binance Types
//!
//! `!ticker@arr` pushes an array of 24h rolling tickers for every symbol
//! once per second. Spot entries carry best bid/ask (`b`/`a`); futures
//! entries do not.

use serde::Deserialize;

use crate::adapters::types::{parse_decimal, parse_opt_decimal, RawQuote, SymbolFormat};

/// One entry of the `!ticker@arr` payload
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceTicker {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c")]
    pub last: String,
    #[serde(rename = "b", default)]
    pub bid: Option<String>,
    #[serde(rename = "a", default)]
    pub ask: Option<String>,
    /// Base asset volume
    #[serde(rename = "v", default)]
    pub volume: Option<String>,
    #[serde(rename = "r", default)]
    pub funding_rate: Option<String>,
}

impl BinanceTicker {
    pub fn to_quote(&self, format: SymbolFormat) -> Option<RawQuote> {
        Some(RawQuote {
            symbol: format.to_canonical(&self.symbol)?,
            last: parse_decimal(&self.last)?,
            bid: parse_opt_decimal(self.bid.as_deref()),
            ask: parse_opt_decimal(self.ask.as_deref()),
            volume_24h: parse_opt_decimal(self.volume.as_deref()),
            funding_rate: parse_opt_decimal(self.funding_rate.as_deref()),
            ..RawQuote::default()
        })
    }
}

/// Parse a `!ticker@arr` frame; non-USDT pairs and malformed frames yield nothing
pub fn parse_ticker_array(text: &str, format: SymbolFormat) -> Vec<RawQuote> {
    match serde_json::from_str::<Vec<BinanceTicker>>(text) {
        Ok(tickers) => tickers.iter().filter_map(|t| t.to_quote(format)).collect(),
        Err(_) => Vec::new(),
    }
}
