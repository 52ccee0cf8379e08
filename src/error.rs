//! Startup errors: configuration loading and server bring-up.
//!
//! Adapter failures have their own `ExchangeError` and never reach this
//! type; a venue that cannot connect is logged and skipped.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Cannot read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Parsed fine but a value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot bind API server to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AppError>;
