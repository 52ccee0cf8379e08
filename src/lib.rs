//! Spread Scanner
//!
//! Real-time multi-venue ticker ingestion and cross-exchange gap detection:
//! - Source adapters (Upbit, Binance, Bybit, OKX, MEXC, Gate.io, Bitget, KuCoin)
//! - Latest-value price store with outlier rejection
//! - Gap detection and a bounded history of significant gaps
//! - HTTP/WebSocket API for clients

pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod server;

pub use error::AppError;
