//! OKX Types
//!
//! `tickers` channel push: `{ arg: { channel, instId }, data: [ ... ] }`.
//! Subscribe acks and errors arrive as `{ event: ... }` and carry no data.

use serde::Deserialize;

use crate::adapters::types::{parse_decimal, parse_opt_decimal, RawQuote, SymbolFormat};

pub const TICKERS_CHANNEL: &str = "tickers";

#[derive(Debug, Clone, Deserialize)]
pub struct OkxArg {
    pub channel: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OkxPush {
    pub arg: OkxArg,
    #[serde(default)]
    pub data: Vec<OkxTicker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OkxTicker {
    pub inst_id: String,
    pub last: String,
    #[serde(default)]
    pub bid_px: Option<String>,
    #[serde(default)]
    pub ask_px: Option<String>,
    /// 24h volume in base currency
    #[serde(default)]
    pub vol24h: Option<String>,
}

impl OkxTicker {
    pub fn to_quote(&self, format: SymbolFormat) -> Option<RawQuote> {
        Some(RawQuote {
            symbol: format.to_canonical(&self.inst_id)?,
            last: parse_decimal(&self.last)?,
            bid: parse_opt_decimal(self.bid_px.as_deref()),
            ask: parse_opt_decimal(self.ask_px.as_deref()),
            volume_24h: parse_opt_decimal(self.vol24h.as_deref()),
            ..RawQuote::default()
        })
    }
}

pub fn parse_message(text: &str, format: SymbolFormat) -> Vec<RawQuote> {
    match serde_json::from_str::<OkxPush>(text) {
        Ok(push) if push.arg.channel == TICKERS_CHANNEL => {
            push.data.iter().filter_map(|t| t.to_quote(format)).collect()
        }
        _ => Vec::new(),
    }
}
