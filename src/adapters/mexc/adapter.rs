//! MEXC socket protocol and REST snapshot venue
//!
//! The socket gateway silently drops mini ticker subscriptions for many
//! pairs, so the default deployment polls the 24hr REST snapshot instead.

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::shared::polling::{PollingAdapter, SnapshotVenue};
use crate::adapters::shared::stream::{batches, Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{RawQuote, SymbolFormat};
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

use super::config::{MexcConfig, PING_INTERVAL, SUBSCRIBE_BATCH_SIZE};
use super::types::{parse_message, parse_snapshot, topic};

pub type MexcAdapter = StreamAdapter<MexcProtocol>;
pub type MexcPollingAdapter = PollingAdapter<MexcSnapshot>;

const FORMAT: SymbolFormat = SymbolFormat::Concat { quote: "USDT" };

#[derive(Debug, Clone, Default)]
pub struct MexcProtocol {
    config: MexcConfig,
}

impl MexcProtocol {
    pub fn new(config: MexcConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VenueProtocol for MexcProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Mexc
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
        Ok(Endpoint::new(self.config.ws_url.clone(), Some(PING_INTERVAL)))
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        batches(symbols, SUBSCRIBE_BATCH_SIZE)
            .into_iter()
            .map(|batch| {
                let params: Vec<String> = batch.iter().map(|s| topic(&FORMAT.to_venue(s))).collect();
                serde_json::json!({ "method": "SUBSCRIPTION", "params": params }).to_string()
            })
            .collect()
    }

    fn keepalive_frame(&self) -> Option<String> {
        Some(serde_json::json!({ "method": "PING" }).to_string())
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        parse_message(text, FORMAT)
    }
}

/// Spot 24hr ticker snapshot over REST
#[derive(Debug, Clone, Default)]
pub struct MexcSnapshot {
    config: MexcConfig,
}

impl MexcSnapshot {
    pub fn new(config: MexcConfig) -> Self {
        Self { config }
    }
}

impl SnapshotVenue for MexcSnapshot {
    fn exchange(&self) -> Exchange {
        Exchange::Mexc
    }

    fn market_type(&self) -> MarketType {
        MarketType::Spot
    }

    fn quote_currency(&self) -> QuoteCurrency {
        QuoteCurrency::Usdt
    }

    fn snapshot_url(&self) -> String {
        self.config.snapshot_url()
    }

    fn parse_snapshot(&self, body: &str) -> ExchangeResult<Vec<RawQuote>> {
        parse_snapshot(body, FORMAT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::shared::polling::fetch_snapshot;
    use crate::adapters::types::create_http_client;

    #[test]
    fn test_subscribe_batches_of_thirty() {
        let protocol = MexcProtocol::default();
        let symbols: Vec<String> = (0..31).map(|i| format!("C{}", i)).collect();
        let frames = protocol.subscribe_frames(&symbols);
        assert_eq!(frames.len(), 2);

        let first: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(first["method"], "SUBSCRIPTION");
        assert_eq!(first["params"].as_array().unwrap().len(), 30);
        assert_eq!(first["params"][0], "spot@public.miniTicker.v3.api@C0USDT@UTC+8");

        let second: serde_json::Value = serde_json::from_str(&frames[1]).unwrap();
        assert_eq!(second["params"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_ping_frame() {
        assert_eq!(
            MexcProtocol::default().keepalive_frame().as_deref(),
            Some(r#"{"method":"PING"}"#)
        );
    }

    #[tokio::test]
    async fn test_snapshot_over_http() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/ticker/24hr")
            .with_status(200)
            .with_body(r#"[{"symbol":"XRPUSDT","lastPrice":"0.52","bidPrice":"0.5199","askPrice":"0.5201"}]"#)
            .create_async()
            .await;

        let venue = MexcSnapshot::new(MexcConfig {
            ws_url: String::new(),
            rest_url: server.url(),
        });
        let quotes = fetch_snapshot(&venue, &create_http_client(Exchange::Mexc))
            .await
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol, "XRP");
        assert_eq!(quotes[0].last, 0.52);
    }
}
