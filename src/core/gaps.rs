//! Gap detection over a price snapshot.
//!
//! For every symbol quoted by at least two venue/market entries, the
//! cheapest and most expensive quote (by `last`) form a `Gap`:
//! `spread = (high − low) / low × 100`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::history::GapRecord;
use crate::core::types::{Exchange, NormalizedTicker};

/// Conventional notional (KRW) for profit estimates
pub const DEFAULT_NOTIONAL_KRW: f64 = 1_000_000.0;

/// Market pairing of the two legs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapType {
    #[serde(rename = "spot-spot")]
    SpotSpot,
    #[serde(rename = "spot-futures")]
    SpotFutures,
    #[serde(rename = "futures-futures")]
    FuturesFutures,
}

impl GapType {
    pub fn classify(low: &NormalizedTicker, high: &NormalizedTicker) -> Self {
        match (low.market_type.is_spot(), high.market_type.is_spot()) {
            (true, true) => GapType::SpotSpot,
            (false, false) => GapType::FuturesFutures,
            _ => GapType::SpotFutures,
        }
    }
}

/// Cheapest and most expensive quote of one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    pub symbol: String,
    /// Percent
    pub spread: f64,
    pub gap_type: GapType,
    pub low: NormalizedTicker,
    pub high: NormalizedTicker,
    /// Sum of the group's 24h volumes, missing counted as zero
    pub volume_24h: f64,
}

impl Gap {
    /// Gross spread captured on `notional` (same currency as the notional)
    pub fn estimated_profit(&self, notional: f64) -> f64 {
        notional * self.spread / 100.0
    }

    pub fn to_record(&self, timestamp: u64) -> GapRecord {
        GapRecord {
            symbol: self.symbol.clone(),
            spread: self.spread,
            low_exchange: self.low.exchange,
            high_exchange: self.high.exchange,
            timestamp,
        }
    }
}

/// Compute one gap per symbol with at least two entries. Output is unordered.
pub fn detect_gaps(tickers: &[NormalizedTicker]) -> Vec<Gap> {
    let mut groups: HashMap<&str, Vec<&NormalizedTicker>> = HashMap::new();
    for ticker in tickers {
        groups.entry(ticker.symbol.as_str()).or_default().push(ticker);
    }

    groups
        .into_iter()
        .filter_map(|(symbol, mut group)| {
            if group.len() < 2 {
                return None;
            }
            group.sort_by(|a, b| {
                a.last
                    .total_cmp(&b.last)
                    .then(a.exchange.cmp(&b.exchange))
                    .then(a.market_type.cmp(&b.market_type))
            });
            let low = *group.first()?;
            let high = *group.last()?;
            if low.last <= 0.0 {
                return None;
            }

            Some(Gap {
                symbol: symbol.to_string(),
                spread: (high.last - low.last) / low.last * 100.0,
                gap_type: GapType::classify(low, high),
                low: low.clone(),
                high: high.clone(),
                volume_24h: group.iter().map(|t| t.volume_24h.unwrap_or(0.0)).sum(),
            })
        })
        .collect()
}

/// Largest spread first
pub fn sort_by_spread_desc(gaps: &mut [Gap]) {
    gaps.sort_by(|a, b| b.spread.total_cmp(&a.spread).then_with(|| a.symbol.cmp(&b.symbol)));
}

/// Query-side narrowing of gap results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapFilter {
    /// Keep gaps with `spread >= min_spread`
    pub min_spread: Option<f64>,
    /// Restrict detection to quotes from these exchanges
    pub exchanges: Option<Vec<Exchange>>,
}

impl GapFilter {
    fn accepts_ticker(&self, ticker: &NormalizedTicker) -> bool {
        self.exchanges
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&ticker.exchange))
    }

    fn accepts_gap(&self, gap: &Gap) -> bool {
        self.min_spread.map_or(true, |min| gap.spread >= min)
    }

    /// Detect gaps among the allowed exchanges, sorted by spread descending
    pub fn detect(&self, tickers: &[NormalizedTicker]) -> Vec<Gap> {
        let scoped: Vec<NormalizedTicker> = tickers
            .iter()
            .filter(|t| self.accepts_ticker(t))
            .cloned()
            .collect();
        let mut gaps: Vec<Gap> = detect_gaps(&scoped)
            .into_iter()
            .filter(|g| self.accepts_gap(g))
            .collect();
        sort_by_spread_desc(&mut gaps);
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MarketType;

    fn ticker(exchange: Exchange, market: MarketType, symbol: &str, last: f64) -> NormalizedTicker {
        NormalizedTicker::new(exchange, market, symbol, last)
    }

    #[test]
    fn test_single_entry_yields_nothing() {
        let tickers = vec![ticker(Exchange::Upbit, MarketType::Spot, "BTC", 100.0)];
        assert!(detect_gaps(&tickers).is_empty());
    }

    #[test]
    fn test_spread_and_legs() {
        let tickers = vec![
            ticker(Exchange::Upbit, MarketType::Spot, "S", 105.0),
            ticker(Exchange::Okx, MarketType::Spot, "S", 100.0),
        ];
        let gaps = detect_gaps(&tickers);
        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert!((gap.spread - 5.0).abs() < 1e-9);
        assert_eq!(gap.low.exchange, Exchange::Okx);
        assert_eq!(gap.high.exchange, Exchange::Upbit);
        assert_eq!(gap.gap_type, GapType::SpotSpot);
    }

    #[test]
    fn test_gap_type_rules() {
        let spot_futures = vec![
            ticker(Exchange::Binance, MarketType::Spot, "ETH", 100.0),
            ticker(Exchange::Binance, MarketType::Futures, "ETH", 101.0),
        ];
        assert_eq!(detect_gaps(&spot_futures)[0].gap_type, GapType::SpotFutures);

        let futures_futures = vec![
            ticker(Exchange::Binance, MarketType::Futures, "ETH", 100.0),
            ticker(Exchange::Bybit, MarketType::Perpetual, "ETH", 101.0),
        ];
        assert_eq!(
            detect_gaps(&futures_futures)[0].gap_type,
            GapType::FuturesFutures
        );
    }

    #[test]
    fn test_ties_broken_by_exchange_then_market() {
        let tickers = vec![
            ticker(Exchange::Kucoin, MarketType::Spot, "XRP", 100.0),
            ticker(Exchange::Binance, MarketType::Futures, "XRP", 100.0),
            ticker(Exchange::Binance, MarketType::Spot, "XRP", 100.0),
        ];
        let gap = &detect_gaps(&tickers)[0];
        assert_eq!((gap.low.exchange, gap.low.market_type), (Exchange::Binance, MarketType::Spot));
        assert_eq!(gap.high.exchange, Exchange::Kucoin);
        assert_eq!(gap.spread, 0.0);
    }

    #[test]
    fn test_non_positive_low_skipped() {
        let tickers = vec![
            ticker(Exchange::Upbit, MarketType::Spot, "BAD", 0.0),
            ticker(Exchange::Okx, MarketType::Spot, "BAD", 1.0),
        ];
        assert!(detect_gaps(&tickers).is_empty());
    }

    #[test]
    fn test_volume_sums_missing_as_zero() {
        let tickers = vec![
            ticker(Exchange::Upbit, MarketType::Spot, "SOL", 100.0).with_volume(10.0),
            ticker(Exchange::Okx, MarketType::Spot, "SOL", 101.0),
            ticker(Exchange::Bybit, MarketType::Spot, "SOL", 102.0).with_volume(5.5),
        ];
        assert_eq!(detect_gaps(&tickers)[0].volume_24h, 15.5);
    }

    #[test]
    fn test_filter_and_sort() {
        let tickers = vec![
            ticker(Exchange::Upbit, MarketType::Spot, "A", 100.0),
            ticker(Exchange::Okx, MarketType::Spot, "A", 110.0),
            ticker(Exchange::Upbit, MarketType::Spot, "B", 100.0),
            ticker(Exchange::Okx, MarketType::Spot, "B", 100.2),
            ticker(Exchange::Upbit, MarketType::Spot, "C", 100.0),
            ticker(Exchange::Okx, MarketType::Spot, "C", 103.0),
            ticker(Exchange::Mexc, MarketType::Spot, "C", 150.0),
        ];

        let all = GapFilter::default().detect(&tickers);
        let symbols: Vec<&str> = all.iter().map(|g| g.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["C", "A", "B"]);

        let filter = GapFilter {
            min_spread: Some(1.0),
            exchanges: Some(vec![Exchange::Upbit, Exchange::Okx]),
        };
        let narrowed = filter.detect(&tickers);
        let symbols: Vec<&str> = narrowed.iter().map(|g| g.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "C"]);
        assert!((narrowed[1].spread - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimated_profit_and_record() {
        let tickers = vec![
            ticker(Exchange::Upbit, MarketType::Spot, "BTC", 50_000.0),
            ticker(Exchange::Bitget, MarketType::Spot, "BTC", 50_500.0),
        ];
        let gap = &detect_gaps(&tickers)[0];
        assert!((gap.estimated_profit(DEFAULT_NOTIONAL_KRW) - 10_000.0).abs() < 1e-6);

        let record = gap.to_record(42);
        assert_eq!(record.symbol, "BTC");
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.low_exchange, Exchange::Upbit);
    }
}
