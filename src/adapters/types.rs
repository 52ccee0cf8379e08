//! Shared types for source adapters
//!
//! Venue parsers produce `RawQuote`s in the venue's own currency.
//! `SourceCore` is the state every adapter composes: connection flag,
//! interest set, last update time and the ticker sink. It turns raw
//! quotes into `NormalizedTicker`s.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;

use crate::core::rates::RateProvider;
use crate::core::types::{current_time_ms, Exchange, MarketType, NormalizedTicker, QuoteCurrency};

// =============================================================================
// HTTP Client Constants
// =============================================================================

/// HTTP request timeout (seconds)
const HTTP_TIMEOUT_SECS: u64 = 10;
/// HTTP connection timeout (milliseconds)
const HTTP_CONNECT_TIMEOUT_MS: u64 = 3_000;
/// Max idle connections per host in connection pool
const HTTP_POOL_MAX_IDLE: usize = 2;
/// TCP keepalive interval (seconds)
const HTTP_TCP_KEEPALIVE_SECS: u64 = 30;

/// Create the HTTP client used for token handshakes and snapshot polling
pub fn create_http_client(exchange: Exchange) -> reqwest::Client {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_millis(HTTP_CONNECT_TIMEOUT_MS))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE)
        .tcp_keepalive(Duration::from_secs(HTTP_TCP_KEEPALIVE_SECS))
        .tcp_nodelay(true)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());
    tracing::debug!(
        phase = "init",
        exchange = %exchange,
        timeout_s = HTTP_TIMEOUT_SECS,
        connect_timeout_ms = HTTP_CONNECT_TIMEOUT_MS,
        "HTTP client configured"
    );
    client
}

// =============================================================================
// Symbol notation
// =============================================================================

/// How a venue writes a canonical symbol against its quote currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFormat {
    /// "BTCUSDT"
    Concat { quote: &'static str },
    /// "BTC-USDT", "BTC_USDT"
    Separated { separator: char, quote: &'static str },
    /// "KRW-BTC"
    QuoteFirst { separator: char, quote: &'static str },
}

impl SymbolFormat {
    /// Canonical "BTC" → venue notation
    pub fn to_venue(&self, symbol: &str) -> String {
        match self {
            SymbolFormat::Concat { quote } => format!("{}{}", symbol, quote),
            SymbolFormat::Separated { separator, quote } => {
                format!("{}{}{}", symbol, separator, quote)
            }
            SymbolFormat::QuoteFirst { separator, quote } => {
                format!("{}{}{}", quote, separator, symbol)
            }
        }
    }

    /// Venue notation → canonical symbol, `None` for other quote currencies
    pub fn to_canonical(&self, venue_symbol: &str) -> Option<String> {
        let base = match self {
            SymbolFormat::Concat { quote } => venue_symbol.strip_suffix(quote),
            SymbolFormat::Separated { separator, quote } => venue_symbol
                .strip_suffix(quote)
                .and_then(|rest| rest.strip_suffix(*separator)),
            SymbolFormat::QuoteFirst { separator, quote } => venue_symbol
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_prefix(*separator)),
        }?;
        if base.is_empty() {
            None
        } else {
            Some(base.to_string())
        }
    }
}

// =============================================================================
// Quotes and status
// =============================================================================

/// One parsed quote in the venue's currency, symbol already canonical
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuote {
    pub symbol: String,
    pub last: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub volume_24h: Option<f64>,
    pub funding_rate: Option<f64>,
    pub next_funding_time: Option<u64>,
    pub open_interest: Option<f64>,
}

impl RawQuote {
    pub fn new(symbol: impl Into<String>, last: f64) -> Self {
        Self {
            symbol: symbol.into(),
            last,
            ..Self::default()
        }
    }
}

/// Parse a venue decimal string, dropping empty or malformed values
pub fn parse_decimal(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an optional venue decimal string
pub fn parse_opt_decimal(value: Option<&str>) -> Option<f64> {
    value.and_then(parse_decimal)
}

/// Sink invoked for every accepted ticker
pub type TickerCallback = Arc<dyn Fn(NormalizedTicker) + Send + Sync>;

/// Point-in-time adapter health, never fails to produce
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterStatus {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub connected: bool,
    pub subscribed_symbols: usize,
    pub last_update: Option<u64>,
}

// =============================================================================
// SourceCore
// =============================================================================

/// State shared between an adapter handle and its background task.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct SourceCore {
    exchange: Exchange,
    market_type: MarketType,
    quote: QuoteCurrency,
    rates: Arc<RateProvider>,
    connected: Arc<AtomicBool>,
    last_update: Arc<AtomicU64>,
    interest: Arc<RwLock<HashSet<String>>>,
    callback: Arc<RwLock<Option<TickerCallback>>>,
}

impl SourceCore {
    pub fn new(
        exchange: Exchange,
        market_type: MarketType,
        quote: QuoteCurrency,
        rates: Arc<RateProvider>,
    ) -> Self {
        Self {
            exchange,
            market_type,
            quote,
            rates,
            connected: Arc::new(AtomicBool::new(false)),
            last_update: Arc::new(AtomicU64::new(0)),
            interest: Arc::new(RwLock::new(HashSet::new())),
            callback: Arc::new(RwLock::new(None)),
        }
    }

    pub fn exchange(&self) -> Exchange {
        self.exchange
    }

    pub fn market_type(&self) -> MarketType {
        self.market_type
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// Replace the interest set with `symbols` (uppercased)
    pub fn replace_interest(&self, symbols: &[String]) {
        let next: HashSet<String> = symbols.iter().map(|s| s.to_ascii_uppercase()).collect();
        let mut guard = self.interest.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }

    /// Current interest set, sorted for stable request batching
    pub fn interest(&self) -> Vec<String> {
        let guard = self.interest.read().unwrap_or_else(|e| e.into_inner());
        let mut symbols: Vec<String> = guard.iter().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn is_interested(&self, symbol: &str) -> bool {
        let guard = self.interest.read().unwrap_or_else(|e| e.into_inner());
        guard.contains(symbol)
    }

    pub fn set_callback(&self, callback: TickerCallback) {
        let mut guard = self.callback.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(callback);
    }

    /// Monotonic ingestion timestamp: never lower than the previous one
    fn next_timestamp(&self) -> u64 {
        let now = current_time_ms();
        let previous = self.last_update.fetch_max(now, Ordering::AcqRel);
        now.max(previous)
    }

    /// Normalize and convert a raw quote.
    ///
    /// Returns `None` for symbols outside the interest set and non-positive prices.
    pub fn normalize(&self, raw: RawQuote) -> Option<NormalizedTicker> {
        if !raw.last.is_finite() || raw.last <= 0.0 || !self.is_interested(&raw.symbol) {
            return None;
        }

        let bid = raw.bid.filter(|v| *v > 0.0).unwrap_or(raw.last);
        let ask = raw.ask.filter(|v| *v > 0.0).unwrap_or(raw.last);
        let converted = self.quote != QuoteCurrency::Krw;

        Some(NormalizedTicker {
            exchange: self.exchange,
            market_type: self.market_type,
            symbol: raw.symbol,
            base_currency: self.quote,
            bid: self.rates.convert_to_krw(bid, self.quote),
            ask: self.rates.convert_to_krw(ask, self.quote),
            last: self.rates.convert_to_krw(raw.last, self.quote),
            bid_original: converted.then_some(bid),
            ask_original: converted.then_some(ask),
            last_original: converted.then_some(raw.last),
            volume_24h: raw.volume_24h,
            funding_rate: raw.funding_rate,
            next_funding_time: raw.next_funding_time,
            open_interest: raw.open_interest,
            timestamp: self.next_timestamp(),
        })
    }

    /// Normalize a raw quote and hand it to the sink. Returns whether it was emitted.
    pub fn emit(&self, raw: RawQuote) -> bool {
        let Some(ticker) = self.normalize(raw) else {
            return false;
        };
        let callback = {
            let guard = self.callback.read().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        match callback {
            Some(callback) => {
                callback(ticker);
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> AdapterStatus {
        let last_update = self.last_update.load(Ordering::Acquire);
        let subscribed_symbols = self
            .interest
            .read()
            .map(|g| g.len())
            .unwrap_or_else(|e| e.into_inner().len());
        AdapterStatus {
            exchange: self.exchange,
            market_type: self.market_type,
            connected: self.is_connected(),
            subscribed_symbols,
            last_update: (last_update > 0).then_some(last_update),
        }
    }
}
