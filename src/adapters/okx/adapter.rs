//! OKX socket protocol
//!
//! All symbols go out in one subscribe request; no keepalive is sent.

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::shared::stream::{Endpoint, StreamAdapter, VenueProtocol};
use crate::adapters::types::{RawQuote, SymbolFormat};
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

use super::config::OkxConfig;
use super::types::{parse_message, TICKERS_CHANNEL};

pub type OkxAdapter = StreamAdapter<OkxProtocol>;

#[derive(Debug, Clone, Default)]
pub struct OkxProtocol {
    config: OkxConfig,
}

impl OkxProtocol {
    pub fn new(config: OkxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl VenueProtocol for OkxProtocol {
    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }

    fn market_type(&self) -> MarketType {
        MarketType::Spot
    }

    fn quote_currency(&self) -> QuoteCurrency {
        QuoteCurrency::Usdt
    }

    fn symbol_format(&self) -> SymbolFormat {
        SymbolFormat::Separated {
            separator: '-',
            quote: "USDT",
        }
    }

    async fn endpoint(&self) -> ExchangeResult<Endpoint> {
        Ok(Endpoint::new(self.config.ws_url.clone(), None))
    }

    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String> {
        let format = self.symbol_format();
        let args: Vec<serde_json::Value> = symbols
            .iter()
            .map(|s| serde_json::json!({ "channel": TICKERS_CHANNEL, "instId": format.to_venue(s) }))
            .collect();
        vec![serde_json::json!({ "op": "subscribe", "args": args }).to_string()]
    }

    fn parse(&self, text: &str) -> Vec<RawQuote> {
        parse_message(text, self.symbol_format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_subscribe_request() {
        let protocol = OkxProtocol::default();
        let symbols: Vec<String> = (0..120).map(|i| format!("C{}", i)).collect();
        let frames = protocol.subscribe_frames(&symbols);
        assert_eq!(frames.len(), 1);

        let frame: serde_json::Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(frame["args"].as_array().unwrap().len(), 120);
        assert_eq!(frame["args"][0]["channel"], "tickers");
        assert_eq!(frame["args"][0]["instId"], "C0-USDT");
    }

    #[test]
    fn test_symbol_round_trip() {
        let format = OkxProtocol::default().symbol_format();
        assert_eq!(format.to_venue("BTC"), "BTC-USDT");
        assert_eq!(format.to_canonical("BTC-USDT").as_deref(), Some("BTC"));
    }
}
