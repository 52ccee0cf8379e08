//! Bybit socket protocol

use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::shared::stream::{batches, Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{RawQuote, SymbolFormat};
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

use super::config::{BybitConfig, PING_INTERVAL, SUBSCRIBE_BATCH_SIZE};
use super::types::{TickerBook, TICKER_TOPIC_PREFIX};

pub type BybitAdapter = StreamAdapter<BybitProtocol>;

#[derive(Debug)]
pub struct BybitProtocol {
    config: BybitConfig,
    /// Merged ticker state; linear deltas only carry changed fields
    book: Mutex<TickerBook>,
}

impl BybitProtocol {
    pub fn new(config: BybitConfig) -> Self {
        Self {
            config,
            book: Mutex::new(TickerBook::default()),
        }
    }
}

#[async_trait]
impl VenueProtocol for BybitProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    fn market_type(&self) -> MarketType {
        self.config.market
    }

    fn quote_currency(&self) -> QuoteCurrency {
        QuoteCurrency::Usdt
    }

    fn symbol_format(&self) -> SymbolFormat {
        SymbolFormat::Concat { quote: "USDT" }
    }

    async fn endpoint(&self) -> ExchangeResult<Endpoint> {
        Ok(Endpoint::new(self.config.ws_url.clone(), Some(PING_INTERVAL)))
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        let format = self.symbol_format();
        batches(symbols, SUBSCRIBE_BATCH_SIZE)
            .into_iter()
            .map(|batch| {
                let args: Vec<String> = batch
                    .iter()
                    .map(|s| format!("{}{}", TICKER_TOPIC_PREFIX, format.to_venue(s)))
                    .collect();
                serde_json::json!({ "op": "subscribe", "args": args }).to_string()
            })
            .collect()
    }

    fn keepalive_frame(&self) -> Option<String> {
        Some(r#"{"op":"ping"}"#.to_string())
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        self.book
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .apply(text, self.symbol_format())
    }
}
