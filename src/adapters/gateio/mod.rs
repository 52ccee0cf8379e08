//! Gate.io source adapter (spot, socket or REST polling)

pub mod adapter;
pub mod config;
pub mod types;

pub use adapter::{GateioAdapter, GateioPollingAdapter, GateioProtocol, GateioSnapshot};
pub use config::GateioConfig;
