//! Bitget Types
//!
//! Socket push: `{ action: "snapshot"|"update", arg: {...}, data: [ticker] }`
//! with `instId`; the REST snapshot wraps the same ticker fields under
//! `data` with `symbol` instead of `instId`.

use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::types::{parse_decimal, parse_opt_decimal, RawQuote, SymbolFormat};

/// REST success code
const OK_CODE: &str = "00000";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitgetTicker {
    #[serde(alias = "symbol")]
    pub inst_id: String,
    pub last_pr: String,
    #[serde(default)]
    pub bid_pr: Option<String>,
    #[serde(default)]
    pub ask_pr: Option<String>,
    #[serde(default)]
    pub base_volume: Option<String>,
}

impl BitgetTicker {
    pub fn to_quote(&self, format: SymbolFormat) -> Option<RawQuote> {
        Some(RawQuote {
            symbol: format.to_canonical(&self.inst_id)?,
            last: parse_decimal(&self.last_pr)?,
            bid: parse_opt_decimal(self.bid_pr.as_deref()),
            ask: parse_opt_decimal(self.ask_pr.as_deref()),
            volume_24h: parse_opt_decimal(self.base_volume.as_deref()),
            ..RawQuote::default()
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitgetPush {
    pub action: String,
    #[serde(default)]
    pub data: Vec<BitgetTicker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitgetSnapshotResponse {
    pub code: String,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Vec<BitgetTicker>,
}

/// Parse one socket frame. "pong" and subscribe events yield nothing.
pub fn parse_message(text: &str, format: SymbolFormat) -> Vec<RawQuote> {
    match serde_json::from_str::<BitgetPush>(text) {
        Ok(push) if push.action == "snapshot" || push.action == "update" => {
            push.data.iter().filter_map(|t| t.to_quote(format)).collect()
        }
        _ => Vec::new(),
    }
}

/// Parse the REST spot ticker snapshot
pub fn parse_snapshot(body: &str, format: SymbolFormat) -> ExchangeResult<Vec<RawQuote>> {
    let response: BitgetSnapshotResponse = serde_json::from_str(body)
        .map_err(|e| ExchangeError::InvalidResponse(format!("bitget snapshot: {}", e)))?;
    if response.code != OK_CODE {
        return Err(ExchangeError::InvalidResponse(format!(
            "bitget snapshot code {}: {}",
            response.code,
            response.msg.unwrap_or_default()
        )));
    }
    Ok(response.data.iter().filter_map(|t| t.to_quote(format)).collect())
}
