//! Configuration module
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `SourceConfig`, section structs)
//! - YAML loading with env overrides (`load_config`, `resolve_config`)
//! - Logging configuration (`init_logging`)

mod loader;
pub mod logging;
mod types;

pub use types::{
    AppConfig, BroadcastConfig, HistoryConfig, RatesConfig, ReconnectConfig, ServerConfig,
    SourceConfig, StoreConfig, Transport,
};

pub use loader::{load_config, load_config_from_str, resolve_config, DEFAULT_CONFIG_PATH};

pub use logging::init_logging;
