//! Configuration loader for YAML files
//!
//! Handles loading, validating and environment overrides.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::warn;

use crate::error::AppError;

use super::types::AppConfig;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Load configuration from a YAML file
///
/// # Returns
/// * `Ok(AppConfig)` - Successfully loaded and validated configuration
/// * `Err(AppError)` - File not found, parse error, or validation failure
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::ConfigNotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config: AppConfig = serde_yaml::from_reader(reader)?;

    config.validate()?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = if yaml_content.trim().is_empty() {
        AppConfig::default()
    } else {
        serde_yaml::from_str(yaml_content)?
    };

    config.validate()?;

    Ok(config)
}

/// Resolve the runtime configuration.
///
/// Reads `CONFIG_PATH` (default `config.yaml`); a missing file falls back
/// to built-in defaults. `PORT` overrides `server.port`.
pub fn resolve_config() -> Result<AppConfig, AppError> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let path = Path::new(&path);

    let mut config = if path.exists() {
        load_config(path)?
    } else {
        warn!(path = %path.display(), "Config file not found, using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) -> Result<(), AppError> {
    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("invalid PORT '{}': {}", port, e)))?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
