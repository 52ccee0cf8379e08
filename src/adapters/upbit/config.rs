//! Upbit Configuration

const WS_URL: &str = "wss://api.upbit.com/websocket/v1";
const REST_URL: &str = "https://api.upbit.com";

/// Ticket identifying this client in subscribe requests
pub const TICKET: &str = "spread-scanner";

#[derive(Debug, Clone, PartialEq)]
pub struct UpbitConfig {
    pub ws_url: String,
    /// Base URL for market discovery
    pub rest_url: String,
}

impl Default for UpbitConfig {
    fn default() -> Self {
        Self {
            ws_url: WS_URL.to_string(),
            rest_url: REST_URL.to_string(),
        }
    }
}
