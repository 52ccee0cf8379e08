//! Gate.io socket protocol and REST snapshot venue

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::shared::polling::{PollingAdapter, SnapshotVenue};
use crate::adapters::shared::stream::{batches, Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{RawQuote, SymbolFormat};
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

use super::config::{GateioConfig, PING_INTERVAL, SUBSCRIBE_BATCH_SIZE};
use super::types::{parse_message, parse_snapshot, PING_CHANNEL, TICKERS_CHANNEL};

pub type GateioAdapter = StreamAdapter<GateioProtocol>;
pub type GateioPollingAdapter = PollingAdapter<GateioSnapshot>;

const FORMAT: SymbolFormat = SymbolFormat::Separated {
    separator: '_',
    quote: "USDT",
};

fn unix_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone, Default)]
pub struct GateioProtocol {
    config: GateioConfig,
}

impl GateioProtocol {
    pub fn new(config: GateioConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VenueProtocol for GateioProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Gateio
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
        let time = unix_seconds();
        batches(symbols, SUBSCRIBE_BATCH_SIZE)
            .into_iter()
            .map(|batch| {
                let payload: Vec<String> = batch.iter().map(|s| FORMAT.to_venue(s)).collect();
                serde_json::json!({
                    "time": time,
                    "channel": TICKERS_CHANNEL,
                    "event": "subscribe",
                    "payload": payload,
                })
                .to_string()
            })
            .collect()
    }

    fn keepalive_frame(&self) -> Option<String> {
        Some(serde_json::json!({ "time": unix_seconds(), "channel": PING_CHANNEL }).to_string())
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        parse_message(text, FORMAT)
    }
}

/// Spot ticker snapshot over REST
#[derive(Debug, Clone, Default)]
pub struct GateioSnapshot {
    config: GateioConfig,
}

impl GateioSnapshot {
    pub fn new(config: GateioConfig) -> Self {
        Self { config }
    }
}

impl SnapshotVenue for GateioSnapshot {
    fn exchange(&self) -> Exchange {
        Exchange::Gateio
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
