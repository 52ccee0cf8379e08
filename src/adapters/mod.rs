//! Source adapters for spot and derivatives venues
//!
//! This module provides the core abstractions for connecting to
//! cryptocurrency exchanges via WebSocket or REST polling and turning
//! their tickers into `NormalizedTicker`s.

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod errors;
pub mod factory;
pub mod gateio;
pub mod kucoin;
pub mod manager;
pub mod mexc;
pub mod okx;
pub mod shared;
pub mod traits;
pub mod types;
pub mod upbit;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types for convenience
pub use errors::{ExchangeError, ExchangeResult};
pub use factory::{create_adapter, is_supported, AnyAdapter, SUPPORTED_SOURCES};
pub use manager::{ConnectOutcome, ManagerStatus, SourceManager};
pub use traits::SourceAdapter;
pub use types::{AdapterStatus, RawQuote, SourceCore, SymbolFormat, TickerCallback};
pub use upbit::fetch_krw_markets;
