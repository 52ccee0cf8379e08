//! Bitget socket protocol and REST snapshot venue

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::shared::polling::{PollingAdapter, SnapshotVenue};
use crate::adapters::shared::stream::{batches, Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{RawQuote, SymbolFormat};
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

use super::config::{BitgetConfig, PING_INTERVAL, SUBSCRIBE_BATCH_SIZE};
use super::types::{parse_message, parse_snapshot};

pub type BitgetAdapter = StreamAdapter<BitgetProtocol>;
pub type BitgetPollingAdapter = PollingAdapter<BitgetSnapshot>;

const FORMAT: SymbolFormat = SymbolFormat::Concat { quote: "USDT" };

#[derive(Debug, Clone, Default)]
pub struct BitgetProtocol {
    config: BitgetConfig,
}

impl BitgetProtocol {
    pub fn new(config: BitgetConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VenueProtocol for BitgetProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Bitget
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
                let args: Vec<serde_json::Value> = batch
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "instType": "SPOT",
                            "channel": "ticker",
                            "instId": FORMAT.to_venue(s),
                        })
                    })
                    .collect();
                serde_json::json!({ "op": "subscribe", "args": args }).to_string()
            })
            .collect()
    }

    fn keepalive_frame(&self) -> Option<String> {
        Some("ping".to_string())
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        parse_message(text, FORMAT)
    }
}

/// Spot ticker snapshot over REST
#[derive(Debug, Clone, Default)]
pub struct BitgetSnapshot {
    config: BitgetConfig,
}

impl BitgetSnapshot {
    pub fn new(config: BitgetConfig) -> Self {
        Self { config }
    }
}

impl SnapshotVenue for BitgetSnapshot {
    fn exchange(&self) -> Exchange {
        Exchange::Bitget
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
