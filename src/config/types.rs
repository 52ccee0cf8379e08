//! Configuration types for the scanner
//!
//! This module defines all configuration structs loaded from YAML.
//! Every section has defaults, so an empty document is a working config.

use serde::{Deserialize, Serialize};

use crate::core::types::{Exchange, MarketType};
use crate::error::AppError;

// ============================================================================
// Defaults
// ============================================================================

fn default_symbols() -> Vec<String> {
    ["BTC", "ETH", "XRP", "SOL", "DOGE"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::stream(Exchange::Upbit, MarketType::Spot),
        SourceConfig::stream(Exchange::Binance, MarketType::Spot),
        SourceConfig::stream(Exchange::Binance, MarketType::Futures),
        SourceConfig::stream(Exchange::Bybit, MarketType::Spot),
        SourceConfig::stream(Exchange::Okx, MarketType::Spot),
        SourceConfig::stream(Exchange::Bitget, MarketType::Spot),
        SourceConfig::stream(Exchange::Gateio, MarketType::Spot),
        SourceConfig::stream(Exchange::Kucoin, MarketType::Spot),
        SourceConfig::polling(Exchange::Mexc, MarketType::Spot),
    ]
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

// ============================================================================
// Sources
// ============================================================================

/// How an adapter obtains quotes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Push socket with keepalive and reconnection
    #[default]
    Stream,
    /// Periodic REST snapshot of the whole market
    Polling,
}

/// One adapter to register with the source manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub exchange: Exchange,
    #[serde(default)]
    pub market: MarketType,
    #[serde(default)]
    pub transport: Transport,
    /// Only used by polling sources
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl SourceConfig {
    pub fn stream(exchange: Exchange, market: MarketType) -> Self {
        Self {
            exchange,
            market,
            transport: Transport::Stream,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    pub fn polling(exchange: Exchange, market: MarketType) -> Self {
        Self {
            transport: Transport::Polling,
            ..Self::stream(exchange, market)
        }
    }

    /// Key used for logs and error messages ("binance/futures")
    pub fn label(&self) -> String {
        format!("{}/{}", self.exchange, self.market)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Price store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Max relative deviation from the cross-venue mean (5.0 = 500%)
    pub outlier_threshold: f64,
    /// Symbols dropped before any processing
    pub blocked_symbols: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            outlier_threshold: 5.0,
            blocked_symbols: vec!["BEAM".to_string(), "GAS".to_string()],
        }
    }
}

/// Gap history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
    /// Gaps at or above this spread (percent) are recorded
    pub min_spread_percent: f64,
    pub snapshot_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            min_spread_percent: 0.5,
            snapshot_interval_secs: 60,
        }
    }
}

/// Socket reconnection policy: fixed delay, bounded attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: 3_000,
            max_attempts: 5,
        }
    }
}

/// FX rate source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    pub url: String,
    pub default_usd_krw: f64,
    /// USDT/KRW = USD/KRW × usdt_ratio
    pub usdt_ratio: f64,
    /// 0 disables periodic refresh
    pub refresh_interval_secs: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            url: "https://api.exchangerate-api.com/v4/latest/USD".to_string(),
            default_usd_krw: 1_380.0,
            usdt_ratio: 0.998,
            refresh_interval_secs: 0,
        }
    }
}

/// Outbound push settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub flush_interval_ms: u64,
    pub channel_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 1_000,
            channel_capacity: 256,
        }
    }
}

/// HTTP/WS API server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3001 }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    /// Replace `symbols` with every Upbit KRW market at startup
    #[serde(default)]
    pub discover_upbit_markets: bool,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            discover_upbit_markets: false,
            sources: default_sources(),
            store: StoreConfig::default(),
            history: HistoryConfig::default(),
            broadcast: BroadcastConfig::default(),
            reconnect: ReconnectConfig::default(),
            rates: RatesConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), AppError> {
        if self.symbols.is_empty() && !self.discover_upbit_markets {
            return Err(AppError::Config(
                "symbols cannot be empty unless discover_upbit_markets is set".to_string(),
            ));
        }

        if let Some(bad) = self.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(AppError::Config(format!("invalid symbol '{}'", bad)));
        }

        if self.sources.is_empty() {
            return Err(AppError::Config("at least one source is required".to_string()));
        }

        for source in &self.sources {
            if !crate::adapters::factory::is_supported(source) {
                return Err(AppError::Config(format!(
                    "source '{}' ({:?}) has no adapter",
                    source.label(),
                    source.transport
                )));
            }
            if source.transport == Transport::Polling && source.poll_interval_ms == 0 {
                return Err(AppError::Config(format!(
                    "source '{}': poll_interval_ms must be > 0",
                    source.label()
                )));
            }
        }

        if !self.store.outlier_threshold.is_finite() || self.store.outlier_threshold <= 0.0 {
            return Err(AppError::Config(format!(
                "store.outlier_threshold must be a positive finite number (got {})",
                self.store.outlier_threshold
            )));
        }

        if self.history.capacity == 0 {
            return Err(AppError::Config("history.capacity must be > 0".to_string()));
        }

        if !self.history.min_spread_percent.is_finite() || self.history.min_spread_percent < 0.0 {
            return Err(AppError::Config(format!(
                "history.min_spread_percent must be >= 0 (got {})",
                self.history.min_spread_percent
            )));
        }

        if self.history.snapshot_interval_secs == 0 || self.broadcast.flush_interval_ms == 0 {
            return Err(AppError::Config(
                "history.snapshot_interval_secs and broadcast.flush_interval_ms must be > 0"
                    .to_string(),
            ));
        }

        if self.reconnect.max_attempts == 0 {
            return Err(AppError::Config("reconnect.max_attempts must be > 0".to_string()));
        }

        if self.rates.default_usd_krw <= 0.0 || self.rates.usdt_ratio <= 0.0 {
            return Err(AppError::Config(
                "rates.default_usd_krw and rates.usdt_ratio must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Symbols normalized to uppercase, blanks removed, deduplicated
    pub fn normalized_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .symbols
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}
