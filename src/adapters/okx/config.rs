//! OKX Configuration

const PUBLIC_WS_URL: &str = "wss://ws.okx.com:8443/ws/v5/public";

#[derive(Debug, Clone, PartialEq)]
pub struct OkxConfig {
    pub ws_url: String,
}

impl Default for OkxConfig {
    fn default() -> Self {
        Self {
            ws_url: PUBLIC_WS_URL.to_string(),
        }
    }
}
