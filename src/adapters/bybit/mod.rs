//! Bybit source adapter (spot and USDT linear perpetual)

pub mod adapter;
pub mod config;
pub mod types;

pub use adapter::{BybitAdapter, BybitProtocol};
pub use config::BybitConfig;
