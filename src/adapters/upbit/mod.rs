//! Upbit source adapter (KRW spot) and KRW market discovery

pub mod adapter;
pub mod config;
pub mod markets;
pub mod types;

pub use adapter::{UpbitAdapter, UpbitProtocol};
pub use config::UpbitConfig;
pub use markets::fetch_krw_markets;
