//! KuCoin socket protocol
//!
//! Every (re)connect first requests a fresh public token; the keepalive
//! interval comes from the server advertisement. One topic per subscribe
//! request, spaced out to stay under the request limit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::stream::{Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{create_http_client, RawQuote, SymbolFormat};
use crate::core::types::{current_time_ms, Exchange, MarketType, QuoteCurrency};

use super::config::{KucoinConfig, DEFAULT_PING_INTERVAL, SUBSCRIBE_SPACING};
use super::types::{parse_message, BulletResponse, TICKER_TOPIC_PREFIX};

pub type KucoinAdapter = StreamAdapter<KucoinProtocol>;

const FORMAT: SymbolFormat = SymbolFormat::Separated {
    separator: '-',
    quote: "USDT",
};

#[derive(Debug)]
pub struct KucoinProtocol {
    config: KucoinConfig,
    client: reqwest::Client,
    request_id: AtomicU64,
}

impl Default for KucoinProtocol {
    fn default() -> Self {
        Self::new(KucoinConfig::default())
    }
}

impl KucoinProtocol {
    pub fn new(config: KucoinConfig) -> Self {
        Self {
            config,
            client: create_http_client(Exchange::Kucoin),
            request_id: AtomicU64::new(1),
        }
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl VenueProtocol for KucoinProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Kucoin
    }

    fn market_type(&self) -> MarketType {
        MarketType::Spot
    }

    fn quote_currency(&self) -> QuoteCurrency {
        QuoteCurrency::Usdt
    }

    fn symbol_format(&self) -> SymbolFormat {
        FORMAT
    }

    async fn endpoint(&self) -> ExchangeResult<Endpoint> {
        let response = self
            .client
            .post(self.config.bullet_url())
            .send()
            .await
            .map_err(|e| ExchangeError::ConnectionFailed(format!("token request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ExchangeError::ConnectionFailed(format!(
                "token request returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ExchangeError::Rejected(format!("token request returned {}", status)));
        }

        let bullet: BulletResponse = response.json().await?;
        if !bullet.is_ok() {
            return Err(ExchangeError::Rejected(format!("token request code {}", bullet.code)));
        }

        let data = bullet
            .data
            .ok_or_else(|| ExchangeError::InvalidResponse("token response has no data".to_string()))?;
        let server = data
            .instance_servers
            .first()
            .ok_or_else(|| ExchangeError::InvalidResponse("no instance servers".to_string()))?;

        let keepalive = server
            .ping_interval
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PING_INTERVAL);
        let url = format!(
            "{}?token={}&connectId={}",
            server.endpoint,
            data.token,
            rand::random::<u32>()
        );
        debug!(exchange = "kucoin", endpoint = %server.endpoint, "Public token acquired");

        Ok(Endpoint::new(url, Some(keepalive)))
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        symbols
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": self.next_request_id().to_string(),
                    "type": "subscribe",
                    "topic": format!("{}{}", TICKER_TOPIC_PREFIX, FORMAT.to_venue(s)),
                    "privateChannel": false,
                    "response": true,
                })
                .to_string()
            })
            .collect()
    }

    fn keepalive_frame(&self) -> Option<String> {
        Some(serde_json::json!({ "id": current_time_ms().to_string(), "type": "ping" }).to_string())
    }

    fn frame_spacing(&self) -> Option<Duration> {
        Some(SUBSCRIBE_SPACING)
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        parse_message(text, FORMAT)
    }
}
