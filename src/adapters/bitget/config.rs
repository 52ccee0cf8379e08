//! Bitget Configuration

use std::time::Duration;

const PUBLIC_WS_URL: &str = "wss://ws.bitget.com/v2/ws/public";
const REST_URL: &str = "https://api.bitget.com";

/// Bitget closes connections that send no "ping" within two minutes
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

pub const SUBSCRIBE_BATCH_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct BitgetConfig {
    pub ws_url: String,
    pub rest_url: String,
}

impl Default for BitgetConfig {
    fn default() -> Self {
        Self {
            ws_url: PUBLIC_WS_URL.to_string(),
            rest_url: REST_URL.to_string(),
        }
    }
}

impl BitgetConfig {
    /// Spot ticker snapshot endpoint
    pub fn snapshot_url(&self) -> String {
        format!("{}/api/v2/spot/market/tickers", self.rest_url.trim_end_matches('/'))
    }
}
