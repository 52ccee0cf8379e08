//! Binance socket protocol
//!
//! The all-market stream needs no subscribe request; the interest set is
//! applied client-side.

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::shared::stream::{Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{RawQuote, SymbolFormat};
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

use super::config::BinanceConfig;
use super::types::parse_ticker_array;

pub type BinanceAdapter = StreamAdapter<BinanceProtocol>;

#[derive(Debug, Clone)]
pub struct BinanceProtocol {
    config: BinanceConfig,
}

impl BinanceProtocol {
    pub fn new(config: BinanceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VenueProtocol for BinanceProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
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
        Ok(Endpoint::new(self.config.ws_url.clone(), None))
    }

    fn subscribe_frames(&self, _symbols: &[String]) -> Vec<String> {
        Vec::new()
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        parse_ticker_array(text, self.symbol_format())
    }
}
