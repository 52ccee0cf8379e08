//! Gate.io Types
//!
//! `spot.tickers` update: `{ channel, event: "update", result: ticker }`.
//! The REST `/spot/tickers` array uses the same ticker fields.

use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::types::{parse_decimal, parse_opt_decimal, RawQuote, SymbolFormat};

pub const TICKERS_CHANNEL: &str = "spot.tickers";
pub const PING_CHANNEL: &str = "spot.ping";

#[derive(Debug, Clone, Deserialize)]
pub struct GateioTicker {
    pub currency_pair: String,
    pub last: String,
    #[serde(default)]
    pub lowest_ask: Option<String>,
    #[serde(default)]
    pub highest_bid: Option<String>,
    #[serde(default)]
    pub base_volume: Option<String>,
}

impl GateioTicker {
    pub fn to_quote(&self, format: SymbolFormat) -> Option<RawQuote> {
        Some(RawQuote {
            symbol: format.to_canonical(&self.currency_pair)?,
            last: parse_decimal(&self.last)?,
            bid: parse_opt_decimal(self.highest_bid.as_deref()),
            ask: parse_opt_decimal(self.lowest_ask.as_deref()),
            volume_24h: parse_opt_decimal(self.base_volume.as_deref()),
            ..RawQuote::default()
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GateioPush {
    pub channel: String,
    pub event: String,
    pub result: serde_json::Value,
}

/// Parse one socket frame. Subscribe acks and pongs yield nothing.
pub fn parse_message(text: &str, format: SymbolFormat) -> Vec<RawQuote> {
    let Ok(push) = serde_json::from_str::<GateioPush>(text) else {
        return Vec::new();
    };
    if push.channel != TICKERS_CHANNEL || push.event != "update" {
        return Vec::new();
    }
    serde_json::from_value::<GateioTicker>(push.result)
        .ok()
        .and_then(|ticker| ticker.to_quote(format))
        .into_iter()
        .collect()
}

/// Parse the REST spot ticker array
pub fn parse_snapshot(body: &str, format: SymbolFormat) -> ExchangeResult<Vec<RawQuote>> {
    let tickers: Vec<GateioTicker> = serde_json::from_str(body)
        .map_err(|e| ExchangeError::InvalidResponse(format!("gateio snapshot: {}", e)))?;
    Ok(tickers.iter().filter_map(|t| t.to_quote(format)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: SymbolFormat = SymbolFormat::Separated { separator: '_', quote: "USDT" };

    #[test]
    fn test_parse_update() {
        let json = r#"{
            "time":1700000000,"time_ms":1700000000123,"channel":"spot.tickers","event":"update",
            "result":{"currency_pair":"BTC_USDT","last":"67030.2","lowest_ask":"67030.3",
                      "highest_bid":"67030.1","change_percentage":"1.2","base_volume":"3210.5","quote_volume":"215000000"}
        }"#;
        let quotes = parse_message(json, FORMAT);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "BTC");
        assert_eq!(quotes[0].last, 67030.2);
        assert_eq!(quotes[0].bid, Some(67030.1));
        assert_eq!(quotes[0].ask, Some(67030.3));
        assert_eq!(quotes[0].volume_24h, Some(3210.5));
    }

    #[test]
    fn test_ack_and_pong_are_ignored() {
        let ack = r#"{"time":1700000000,"channel":"spot.tickers","event":"subscribe","result":{"status":"success"}}"#;
        let pong = r#"{"time":1700000000,"channel":"spot.pong","event":"","result":null}"#;
        assert!(parse_message(ack, FORMAT).is_empty());
        assert!(parse_message(pong, FORMAT).is_empty());
    }

    #[test]
    fn test_parse_rest_snapshot() {
        let body = r#"[
            {"currency_pair":"ETH_USDT","last":"3500.5","lowest_ask":"3500.6","highest_bid":"3500.4","base_volume":"100"},
            {"currency_pair":"ETH_BTC","last":"0.05"},
            {"currency_pair":"XRP_USDT","last":""}
        ]"#;
        let quotes = parse_snapshot(body, FORMAT).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "ETH");
    }

    #[test]
    fn test_rest_error_body() {
        let body = r#"{"label":"TOO_MANY_REQUESTS","message":"Request Rate limit Exceeded"}"#;
        assert!(parse_snapshot(body, FORMAT).is_err());
    }
}
