//! OKX source adapter (spot)

pub mod adapter;
pub mod config;
pub mod types;

pub use adapter::{OkxAdapter, OkxProtocol};
pub use config::OkxConfig;
