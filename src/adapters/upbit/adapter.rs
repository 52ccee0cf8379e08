//! Upbit socket protocol
//!
//! One subscribe message carries every market code. Upbit has no
//! client keepalive here; dropped sockets go through the reconnect policy.

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::shared::stream::{Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{RawQuote, SymbolFormat};
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

use super::config::{UpbitConfig, TICKET};
use super::types::parse_message;

pub type UpbitAdapter = StreamAdapter<UpbitProtocol>;

#[derive(Debug, Clone, Default)]
pub struct UpbitProtocol {
    config: UpbitConfig,
}

impl UpbitProtocol {
    pub fn new(config: UpbitConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VenueProtocol for UpbitProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Upbit
    }

    fn market_type(&self) -> MarketType {
        MarketType::Spot
    }

    fn quote_currency(&self) -> QuoteCurrency {
        QuoteCurrency::Krw
    }

    fn symbol_format(&self) -> SymbolFormat {
        SymbolFormat::QuoteFirst {
            separator: '-',
            quote: "KRW",
        }
    }

    async fn endpoint(&self) -> ExchangeResult<Endpoint> {
        Ok(Endpoint::new(self.config.ws_url.clone(), None))
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        let format = self.symbol_format();
        let codes: Vec<String> = symbols.iter().map(|s| format.to_venue(s)).collect();
        vec![serde_json::json!([
            { "ticket": TICKET },
            { "type": "ticker", "codes": codes, "isOnlyRealtime": true }
        ])
        .to_string()]
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        parse_message(text, self.symbol_format())
    }
}
