//! Bybit Types
//!
//! V5 public `tickers.{symbol}` topic. Spot pushes full snapshots; linear
//! pushes a snapshot then deltas that carry only the changed fields.
//! `TickerBook` keeps the merged record per symbol so every quote is built
//! from the full state.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Deserialize;

use crate::adapters::types::{parse_decimal, parse_opt_decimal, RawQuote, SymbolFormat};

/// Topic prefix for ticker subscriptions
pub const TICKER_TOPIC_PREFIX: &str = "tickers.";

/// Envelope for every Bybit public frame
#[derive(Debug, Clone, Deserialize)]
pub struct BybitMessage {
    #[serde(default)]
    pub topic: Option<String>,
    /// "snapshot" or "delta"
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<BybitTickerData>,
}

impl BybitMessage {
    fn is_delta(&self) -> bool {
        self.kind.as_deref() == Some("delta")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BybitTickerData {
    pub symbol: String,
    #[serde(default)]
    pub last_price: Option<String>,
    #[serde(default)]
    pub bid1_price: Option<String>,
    #[serde(default)]
    pub ask1_price: Option<String>,
    #[serde(default)]
    pub volume24h: Option<String>,
    #[serde(default)]
    pub funding_rate: Option<String>,
    #[serde(default)]
    pub next_funding_time: Option<String>,
    #[serde(default)]
    pub open_interest: Option<String>,
}

impl BybitTickerData {
    /// Overwrite the fields present in `delta`
    pub fn merge(&mut self, delta: BybitTickerData) {
        fn take(field: &mut Option<String>, update: Option<String>) {
            if update.is_some() {
                *field = update;
            }
        }
        take(&mut self.last_price, delta.last_price);
        take(&mut self.bid1_price, delta.bid1_price);
        take(&mut self.ask1_price, delta.ask1_price);
        take(&mut self.volume24h, delta.volume24h);
        take(&mut self.funding_rate, delta.funding_rate);
        take(&mut self.next_funding_time, delta.next_funding_time);
        take(&mut self.open_interest, delta.open_interest);
    }

    pub fn to_quote(&self, format: SymbolFormat) -> Option<RawQuote> {
        Some(RawQuote {
            symbol: format.to_canonical(&self.symbol)?,
            last: parse_opt_decimal(self.last_price.as_deref())?,
            bid: parse_opt_decimal(self.bid1_price.as_deref()),
            ask: parse_opt_decimal(self.ask1_price.as_deref()),
            volume_24h: parse_opt_decimal(self.volume24h.as_deref()),
            funding_rate: parse_opt_decimal(self.funding_rate.as_deref()),
            next_funding_time: self
                .next_funding_time
                .as_deref()
                .and_then(|t| t.trim().parse::<u64>().ok()),
            open_interest: self.open_interest.as_deref().and_then(parse_decimal),
        })
    }
}

/// Latest merged ticker record per venue symbol
#[derive(Debug, Default)]
pub struct TickerBook {
    records: HashMap<String, BybitTickerData>,
}

impl TickerBook {
    /// Apply one frame. Pong and subscription acks carry no ticker topic.
    ///
    /// A snapshot replaces the record, a delta is merged onto it. The quote
    /// is built from the merged record, so it needs a `lastPrice` seen in
    /// this frame or an earlier one.
    pub fn apply(&mut self, text: &str, format: SymbolFormat) -> Vec<RawQuote> {
        let Ok(message) = serde_json::from_str::<BybitMessage>(text) else {
            return Vec::new();
        };
        let is_ticker = message
            .topic
            .as_deref()
            .is_some_and(|topic| topic.starts_with(TICKER_TOPIC_PREFIX));
        if !is_ticker {
            return Vec::new();
        }
        let is_delta = message.is_delta();
        let Some(data) = message.data else {
            return Vec::new();
        };

        let record = match self.records.entry(data.symbol.clone()) {
            Entry::Occupied(mut entry) => {
                if is_delta {
                    entry.get_mut().merge(data);
                } else {
                    entry.insert(data);
                }
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(data),
        };
        record.to_quote(format).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: SymbolFormat = SymbolFormat::Concat { quote: "USDT" };

    #[test]
    fn test_parse_spot_snapshot() {
        let json = r#"{
            "topic":"tickers.BTCUSDT","ts":1700000000000,"type":"snapshot","cs":1,
            "data":{"symbol":"BTCUSDT","lastPrice":"67001.5","highPrice24h":"68000","volume24h":"1234.5","usdIndexPrice":"67000"}
        }"#;
        let quotes = TickerBook::default().apply(json, FORMAT);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "BTC");
        assert_eq!(quotes[0].last, 67001.5);
        assert_eq!(quotes[0].volume_24h, Some(1234.5));
        assert_eq!(quotes[0].funding_rate, None);
    }

    #[test]
    fn test_parse_linear_snapshot_with_funding() {
        let json = r#"{
            "topic":"tickers.ETHUSDT","type":"snapshot",
            "data":{"symbol":"ETHUSDT","lastPrice":"3500.25","bid1Price":"3500.2","ask1Price":"3500.3",
                    "volume24h":"88000","fundingRate":"-0.00012","nextFundingTime":"1700006400000","openInterest":"215000.5"}
        }"#;
        let quote = &TickerBook::default().apply(json, FORMAT)[0];
        assert_eq!(quote.bid, Some(3500.2));
        assert_eq!(quote.ask, Some(3500.3));
        assert_eq!(quote.funding_rate, Some(-0.00012));
        assert_eq!(quote.next_funding_time, Some(1_700_006_400_000));
        assert_eq!(quote.open_interest, Some(215000.5));
    }

    #[test]
    fn test_delta_before_any_snapshot_without_last_price_is_skipped() {
        let json = r#"{"topic":"tickers.ETHUSDT","type":"delta","data":{"symbol":"ETHUSDT","bid1Price":"3500.1"}}"#;
        let mut book = TickerBook::default();
        assert!(book.apply(json, FORMAT).is_empty());
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_delta_keeps_fields_from_snapshot() {
        let snapshot = r#"{
            "topic":"tickers.ETHUSDT","type":"snapshot",
            "data":{"symbol":"ETHUSDT","lastPrice":"3500","bid1Price":"3499.9","ask1Price":"3500.1",
                    "volume24h":"88000","fundingRate":"0.0001","nextFundingTime":"1700006400000","openInterest":"215000"}
        }"#;
        let price_only = r#"{"topic":"tickers.ETHUSDT","type":"delta","data":{"symbol":"ETHUSDT","lastPrice":"3502"}}"#;
        let bid_only = r#"{"topic":"tickers.ETHUSDT","type":"delta","data":{"symbol":"ETHUSDT","bid1Price":"3501.5"}}"#;

        let mut book = TickerBook::default();
        assert_eq!(book.apply(snapshot, FORMAT).len(), 1);

        let quote = &book.apply(price_only, FORMAT)[0];
        assert_eq!(quote.last, 3502.0);
        assert_eq!(quote.bid, Some(3499.9));
        assert_eq!(quote.ask, Some(3500.1));
        assert_eq!(quote.funding_rate, Some(0.0001));
        assert_eq!(quote.next_funding_time, Some(1_700_006_400_000));
        assert_eq!(quote.open_interest, Some(215000.0));

        // a delta without lastPrice still quotes from the merged record
        let quote = &book.apply(bid_only, FORMAT)[0];
        assert_eq!(quote.last, 3502.0);
        assert_eq!(quote.bid, Some(3501.5));
    }

    #[test]
    fn test_snapshot_replaces_merged_record() {
        let first = r#"{"topic":"tickers.BTCUSDT","type":"snapshot","data":{"symbol":"BTCUSDT","lastPrice":"67000","fundingRate":"0.0001"}}"#;
        let second = r#"{"topic":"tickers.BTCUSDT","type":"snapshot","data":{"symbol":"BTCUSDT","lastPrice":"67100"}}"#;

        let mut book = TickerBook::default();
        book.apply(first, FORMAT);
        let quote = &book.apply(second, FORMAT)[0];
        assert_eq!(quote.last, 67100.0);
        assert_eq!(quote.funding_rate, None);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_control_frames_are_ignored() {
        let pong = r#"{"success":true,"ret_msg":"pong","conn_id":"abc","op":"ping"}"#;
        let ack = r#"{"success":true,"ret_msg":"","conn_id":"abc","req_id":"","op":"subscribe"}"#;
        let mut book = TickerBook::default();
        assert!(book.apply(pong, FORMAT).is_empty());
        assert!(book.apply(ack, FORMAT).is_empty());
        assert!(book.apply("[]", FORMAT).is_empty());
        assert!(book.is_empty());
    }
}
