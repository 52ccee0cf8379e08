//! Binance source adapter (spot and USDⓈ-M futures)

pub mod adapter;
pub mod config;
pub mod types;

pub use adapter::{BinanceAdapter, BinanceProtocol};
pub use config::BinanceConfig;
