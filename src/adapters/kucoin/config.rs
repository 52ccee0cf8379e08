//! KuCoin Configuration

use std::time::Duration;

const REST_URL: &str = "https://api.kucoin.com";

/// Used when the bullet response omits `pingInterval`
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pause between per-symbol subscribe requests
pub const SUBSCRIBE_SPACING: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq)]
pub struct KucoinConfig {
    /// Base URL for the public token handshake
    pub rest_url: String,
}

impl Default for KucoinConfig {
    fn default() -> Self {
        Self {
            rest_url: REST_URL.to_string(),
        }
    }
}

impl KucoinConfig {
    pub fn bullet_url(&self) -> String {
        format!("{}/api/v1/bullet-public", self.rest_url.trim_end_matches('/'))
    }
}
