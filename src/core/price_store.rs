//! Price store: latest ticker per (symbol, exchange, market).
//!
//! Stores `HashMap<symbol, BTreeMap<(exchange, market), NormalizedTicker>>`.
//! Entries are created on first sight, replaced on every accepted update
//! and never expire. Two guards run before a write:
//! - block-listed symbols are dropped outright
//! - a quote too far from the mean of the same symbol on *other*
//!   exchanges is rejected as a probable symbol collision

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::core::types::{Exchange, MarketType, NormalizedTicker, PriceTable};

/// Every Nth rejected outlier is logged at info level
const OUTLIER_LOG_SAMPLE: u64 = 100;

/// What `update` did with a ticker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    Stored,
    Blocked,
    /// Rejected; `mean` is the cross-exchange mean it was compared against
    Outlier { mean: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_prices: usize,
    pub symbols: usize,
    pub outliers_rejected: u64,
    pub blocked_rejected: u64,
    /// Ticks the adapters produced but the pipeline channel refused
    pub dropped_ticks: u64,
}

/// Latest-value cache for normalized tickers.
///
/// Single writer (the pipeline task); wrap in `Arc<RwLock<>>` for readers.
#[derive(Debug)]
pub struct PriceStore {
    prices: HashMap<String, BTreeMap<(Exchange, MarketType), NormalizedTicker>>,
    outlier_threshold: f64,
    blocked: HashSet<String>,
    outliers_rejected: u64,
    blocked_rejected: u64,
    /// Shared with the ticker sink, which counts without the store lock
    dropped_ticks: Arc<AtomicU64>,
}

impl Default for PriceStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl PriceStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            prices: HashMap::new(),
            outlier_threshold: config.outlier_threshold,
            blocked: config
                .blocked_symbols
                .iter()
                .map(|s| s.trim().to_uppercase())
                .collect(),
            outliers_rejected: 0,
            blocked_rejected: 0,
            dropped_ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter handed to `ticker_sink`
    pub fn drop_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped_ticks)
    }

    pub fn update(&mut self, ticker: NormalizedTicker) -> UpdateOutcome {
        if self.blocked.contains(&ticker.symbol) {
            self.blocked_rejected += 1;
            return UpdateOutcome::Blocked;
        }

        if let Some(mean) = self.cross_exchange_mean(&ticker) {
            if (ticker.last - mean).abs() / mean > self.outlier_threshold {
                self.outliers_rejected += 1;
                if self.outliers_rejected % OUTLIER_LOG_SAMPLE == 1 {
                    info!(
                        symbol = %ticker.symbol,
                        exchange = %ticker.exchange,
                        price = ticker.last,
                        mean,
                        rejected_total = self.outliers_rejected,
                        "Outlier price rejected"
                    );
                } else {
                    debug!(
                        symbol = %ticker.symbol,
                        exchange = %ticker.exchange,
                        price = ticker.last,
                        mean,
                        "Outlier price rejected"
                    );
                }
                return UpdateOutcome::Outlier { mean };
            }
        }

        self.prices
            .entry(ticker.symbol.clone())
            .or_default()
            .insert((ticker.exchange, ticker.market_type), ticker);
        UpdateOutcome::Stored
    }

    /// Mean `last` of the symbol on other exchanges, `None` when there is
    /// nothing to compare against
    fn cross_exchange_mean(&self, ticker: &NormalizedTicker) -> Option<f64> {
        let entries = self.prices.get(&ticker.symbol)?;
        let (sum, count) = entries
            .values()
            .filter(|t| t.exchange != ticker.exchange)
            .fold((0.0, 0usize), |(sum, count), t| (sum + t.last, count + 1));
        if count == 0 {
            return None;
        }
        let mean = sum / count as f64;
        (mean != 0.0).then_some(mean)
    }

    pub fn get(
        &self,
        symbol: &str,
        exchange: Exchange,
        market_type: MarketType,
    ) -> Option<&NormalizedTicker> {
        self.prices.get(symbol)?.get(&(exchange, market_type))
    }

    /// Owned point-in-time copy of every entry
    pub fn snapshot_all(&self) -> Vec<NormalizedTicker> {
        self.prices
            .values()
            .flat_map(|entries| entries.values().cloned())
            .collect()
    }

    /// symbol → "exchange-market" → ticker
    pub fn by_symbol_table(&self) -> PriceTable {
        self.prices
            .iter()
            .map(|(symbol, entries)| {
                let row = entries
                    .values()
                    .map(|t| (t.venue_label(), t.clone()))
                    .collect();
                (symbol.clone(), row)
            })
            .collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_prices: self.len(),
            symbols: self.prices.len(),
            outliers_rejected: self.outliers_rejected,
            blocked_rejected: self.blocked_rejected,
            dropped_ticks: self.dropped_ticks.load(Ordering::Relaxed),
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.prices.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
