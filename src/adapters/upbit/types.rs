//! Upbit Types
//!
//! Ticker frames arrive as binary JSON: `{ type: "ticker", code: "KRW-BTC",
//! trade_price, acc_trade_volume_24h, ... }`. Prices are already KRW.

use serde::Deserialize;

use crate::adapters::types::{RawQuote, SymbolFormat};

#[derive(Debug, Clone, Deserialize)]
pub struct UpbitTicker {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    pub trade_price: f64,
    #[serde(default)]
    pub acc_trade_volume_24h: Option<f64>,
}

/// Entry of `GET /v1/market/all`
#[derive(Debug, Clone, Deserialize)]
pub struct UpbitMarket {
    pub market: String,
}

pub fn parse_message(text: &str, format: SymbolFormat) -> Vec<RawQuote> {
    let Ok(ticker) = serde_json::from_str::<UpbitTicker>(text) else {
        return Vec::new();
    };
    if ticker.kind != "ticker" {
        return Vec::new();
    }
    format
        .to_canonical(&ticker.code)
        .map(|symbol| RawQuote {
            symbol,
            last: ticker.trade_price,
            volume_24h: ticker.acc_trade_volume_24h,
            ..RawQuote::default()
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: SymbolFormat = SymbolFormat::QuoteFirst { separator: '-', quote: "KRW" };

    #[test]
    fn test_parse_ticker() {
        let json = r#"{"type":"ticker","code":"KRW-BTC","opening_price":94000000.0,"trade_price":95123000.0,
                       "acc_trade_volume_24h":2345.67,"stream_type":"REALTIME","timestamp":1700000000000}"#;
        let quotes = parse_message(json, FORMAT);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "BTC");
        assert_eq!(quotes[0].last, 95_123_000.0);
        assert_eq!(quotes[0].volume_24h, Some(2345.67));
        assert_eq!(quotes[0].bid, None);
    }

    #[test]
    fn test_non_krw_market_is_skipped() {
        let json = r#"{"type":"ticker","code":"BTC-ETH","trade_price":0.05}"#;
        assert!(parse_message(json, FORMAT).is_empty());
    }

    #[test]
    fn test_other_frames_are_ignored() {
        assert!(parse_message(r#"{"status":"UP"}"#, FORMAT).is_empty());
        assert!(parse_message(r#"{"type":"trade","code":"KRW-BTC","trade_price":1.0}"#, FORMAT).is_empty());
        assert!(parse_message(r#"{"error":{"name":"INVALID_AUTH"}}"#, FORMAT).is_empty());
    }
}
