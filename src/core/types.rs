//! Core types for the ticker pipeline
//!
//! `NormalizedTicker` is the single schema every adapter emits.
//! Prices are already converted to KRW when they reach this type.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// Venue identity
// =============================================================================

/// Exchanges with a source adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Upbit,
    Binance,
    Bybit,
    Okx,
    Mexc,
    Gateio,
    Bitget,
    Kucoin,
}

impl Exchange {
    pub const ALL: [Exchange; 8] = [
        Exchange::Upbit,
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Okx,
        Exchange::Mexc,
        Exchange::Gateio,
        Exchange::Bitget,
        Exchange::Kucoin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Upbit => "upbit",
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Okx => "okx",
            Exchange::Mexc => "mexc",
            Exchange::Gateio => "gateio",
            Exchange::Bitget => "bitget",
            Exchange::Kucoin => "kucoin",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Exchange::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == lower)
            .ok_or_else(|| format!("unknown exchange '{}'", s))
    }
}

/// Market segment a quote belongs to
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    #[default]
    Spot,
    Futures,
    Perpetual,
    Swap,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Spot => "spot",
            MarketType::Futures => "futures",
            MarketType::Perpetual => "perpetual",
            MarketType::Swap => "swap",
        }
    }

    pub fn is_spot(&self) -> bool {
        matches!(self, MarketType::Spot)
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Currency a venue quotes its prices in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteCurrency {
    Krw,
    Usdt,
    Usd,
}

impl QuoteCurrency {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteCurrency::Krw => "KRW",
            QuoteCurrency::Usdt => "USDT",
            QuoteCurrency::Usd => "USD",
        }
    }
}

impl fmt::Display for QuoteCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Ticker
// =============================================================================

/// Canonical quote record emitted by every source adapter.
///
/// `symbol` is the bare base asset ("BTC"). `bid`/`ask`/`last` are in KRW;
/// the `*_original` fields carry the venue's own quote when a conversion
/// happened. `timestamp` is ingestion time, monotonic per adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTicker {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub symbol: String,
    pub base_currency: QuoteCurrency,
    pub bid: f64,
    pub ask: f64,
    pub last: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_original: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ask_original: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_original: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_funding_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_interest: Option<f64>,
    pub timestamp: u64,
}

impl NormalizedTicker {
    /// Minimal KRW ticker, mostly for tests and benches
    pub fn new(exchange: Exchange, market_type: MarketType, symbol: &str, last: f64) -> Self {
        Self {
            exchange,
            market_type,
            symbol: symbol.to_string(),
            base_currency: QuoteCurrency::Krw,
            bid: last,
            ask: last,
            last,
            bid_original: None,
            ask_original: None,
            last_original: None,
            volume_24h: None,
            funding_rate: None,
            next_funding_time: None,
            open_interest: None,
            timestamp: current_time_ms(),
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume_24h = Some(volume);
        self
    }

    /// "exchange-market" label used by the price table view
    pub fn venue_label(&self) -> String {
        format!("{}-{}", self.exchange, self.market_type)
    }
}

/// symbol → "exchange-market" → latest ticker
pub type PriceTable = BTreeMap<String, BTreeMap<String, NormalizedTicker>>;

// =============================================================================
// Broadcast events
// =============================================================================

/// Events pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum BroadcastEvent {
    /// Full price table, sent once when a client connects
    #[serde(rename = "initial_prices")]
    InitialPrices(PriceTable),
    /// Tickers accepted since the previous flush
    #[serde(rename = "price_batch")]
    PriceBatch(Vec<NormalizedTicker>),
    /// Periodic history snapshot summary
    #[serde(rename = "history_snapshot")]
    HistorySnapshot { recorded: usize, total: usize },
}

/// Current wall-clock time in epoch milliseconds
pub fn current_time_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
