//! KuCoin source adapter (spot, token-gated socket)

pub mod adapter;
pub mod config;
pub mod types;

pub use adapter::{KucoinAdapter, KucoinProtocol};
pub use config::KucoinConfig;
