//! KuCoin Types
//!
//! The socket URL is obtained from `POST /api/v1/bullet-public`, which
//! returns a token and instance servers. Ticker pushes look like
//! `{ type: "message", topic: "/market/ticker:BTC-USDT", data: {...} }`.

use serde::Deserialize;

use crate::adapters::types::{parse_decimal, parse_opt_decimal, RawQuote, SymbolFormat};

pub const TICKER_TOPIC_PREFIX: &str = "/market/ticker:";

const OK_CODE: &str = "200000";

#[derive(Debug, Clone, Deserialize)]
pub struct BulletResponse {
    pub code: String,
    #[serde(default)]
    pub data: Option<BulletData>,
}

impl BulletResponse {
    pub fn is_ok(&self) -> bool {
        self.code == OK_CODE
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletData {
    pub token: String,
    pub instance_servers: Vec<InstanceServer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceServer {
    pub endpoint: String,
    /// Milliseconds
    #[serde(default)]
    pub ping_interval: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KucoinMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub data: Option<KucoinTicker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KucoinTicker {
    pub price: String,
    #[serde(default)]
    pub best_bid: Option<String>,
    #[serde(default)]
    pub best_ask: Option<String>,
}

/// Parse one frame. Welcome, ack and pong frames yield nothing.
pub fn parse_message(text: &str, format: SymbolFormat) -> Vec<RawQuote> {
    let Ok(message) = serde_json::from_str::<KucoinMessage>(text) else {
        return Vec::new();
    };
    if message.kind != "message" {
        return Vec::new();
    }
    let symbol = message
        .topic
        .as_deref()
        .and_then(|topic| topic.strip_prefix(TICKER_TOPIC_PREFIX))
        .and_then(|pair| format.to_canonical(pair));
    let (Some(symbol), Some(data)) = (symbol, message.data) else {
        return Vec::new();
    };
    let Some(last) = parse_decimal(&data.price) else {
        return Vec::new();
    };
    vec![RawQuote {
        symbol,
        last,
        bid: parse_opt_decimal(data.best_bid.as_deref()),
        ask: parse_opt_decimal(data.best_ask.as_deref()),
        ..RawQuote::default()
    }]
}
