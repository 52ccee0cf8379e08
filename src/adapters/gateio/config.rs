//! Gate.io Configuration

use std::time::Duration;

const WS_URL: &str = "wss://api.gateio.ws/ws/v4/";
const REST_URL: &str = "https://api.gateio.ws";

pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Currency pairs per `spot.tickers` subscribe request
pub const SUBSCRIBE_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct GateioConfig {
    pub ws_url: String,
    pub rest_url: String,
}

impl Default for GateioConfig {
    fn default() -> Self {
        Self {
            ws_url: WS_URL.to_string(),
            rest_url: REST_URL.to_string(),
        }
    }
}

impl GateioConfig {
    pub fn snapshot_url(&self) -> String {
        format!("{}/api/v4/spot/tickers", self.rest_url.trim_end_matches('/'))
    }
}
