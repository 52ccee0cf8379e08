//! MEXC source adapter (spot, socket or REST polling)

pub mod adapter;
pub mod config;
pub mod types;

pub use adapter::{MexcAdapter, MexcPollingAdapter, MexcProtocol, MexcSnapshot};
pub use config::MexcConfig;
