//! MEXC Configuration

use std::time::Duration;

const WS_URL: &str = "wss://wbs.mexc.com/ws";
const REST_URL: &str = "https://api.mexc.com";

pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Topics per SUBSCRIPTION request (venue limit)
pub const SUBSCRIBE_BATCH_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct MexcConfig {
    pub ws_url: String,
    pub rest_url: String,
}

impl Default for MexcConfig {
    fn default() -> Self {
        Self {
            ws_url: WS_URL.to_string(),
            rest_url: REST_URL.to_string(),
        }
    }
}

impl MexcConfig {
    pub fn snapshot_url(&self) -> String {
        format!("{}/api/v3/ticker/24hr", self.rest_url.trim_end_matches('/'))
    }
}
