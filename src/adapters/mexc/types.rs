//! MEXC Types
//!
//! Mini ticker pushes come in two shapes depending on the gateway
//! version: `{ c, s, publicMiniTicker: { symbol, price } }` or
//! `{ c, s, d: { s, c } }`. The REST 24hr endpoint returns an array.

use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::types::{parse_decimal, parse_opt_decimal, RawQuote, SymbolFormat};

pub const MINI_TICKER_CHANNEL: &str = "spot@public.miniTicker.v3.api";
pub const TIMEZONE: &str = "UTC+8";

/// `spot@public.miniTicker.v3.api@BTCUSDT@UTC+8`
pub fn topic(pair: &str) -> String {
    format!("{}@{}@{}", MINI_TICKER_CHANNEL, pair, TIMEZONE)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcPush {
    #[serde(default)]
    pub public_mini_ticker: Option<MiniTicker>,
    #[serde(default)]
    pub d: Option<CompactTicker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MiniTicker {
    pub symbol: String,
    pub price: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompactTicker {
    pub s: String,
    pub c: String,
}

/// Parse one socket frame. PONG and subscription acks yield nothing.
pub fn parse_message(text: &str, format: SymbolFormat) -> Vec<RawQuote> {
    let Ok(push) = serde_json::from_str::<MexcPush>(text) else {
        return Vec::new();
    };
    let (pair, price) = match (&push.public_mini_ticker, &push.d) {
        (Some(mini), _) => (mini.symbol.as_str(), mini.price.as_str()),
        (None, Some(compact)) => (compact.s.as_str(), compact.c.as_str()),
        (None, None) => return Vec::new(),
    };
    let (Some(symbol), Some(last)) = (format.to_canonical(pair), parse_decimal(price)) else {
        return Vec::new();
    };
    vec![RawQuote::new(symbol, last)]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MexcRestTicker {
    pub symbol: String,
    pub last_price: String,
    #[serde(default)]
    pub bid_price: Option<String>,
    #[serde(default)]
    pub ask_price: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
}

/// Parse the REST 24hr ticker array
pub fn parse_snapshot(body: &str, format: SymbolFormat) -> ExchangeResult<Vec<RawQuote>> {
    let tickers: Vec<MexcRestTicker> = serde_json::from_str(body)
        .map_err(|e| ExchangeError::InvalidResponse(format!("mexc snapshot: {}", e)))?;
    Ok(tickers
        .iter()
        .filter_map(|t| {
            Some(RawQuote {
                symbol: format.to_canonical(&t.symbol)?,
                last: parse_decimal(&t.last_price)?,
                bid: parse_opt_decimal(t.bid_price.as_deref()),
                ask: parse_opt_decimal(t.ask_price.as_deref()),
                volume_24h: parse_opt_decimal(t.volume.as_deref()),
                ..RawQuote::default()
            })
        })
        .collect())
}
