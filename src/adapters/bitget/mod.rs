//! Bitget source adapter (spot, socket or REST polling)

pub mod adapter;
pub mod config;
pub mod types;

pub use adapter::{BitgetAdapter, BitgetPollingAdapter, BitgetProtocol, BitgetSnapshot};
pub use config::BitgetConfig;
