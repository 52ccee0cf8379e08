//! Binance Configuration

use crate::core::types::MarketType;

/// Spot all-market ticker stream
const SPOT_WS_URL: &str = "wss://stream.binance.com:9443/ws/!ticker@arr";

/// USDⓈ-M futures all-market ticker stream
const FUTURES_WS_URL: &str = "wss://fstream.binance.com/ws/!ticker@arr";

/// Configuration for one Binance market stream
#[derive(Debug, Clone, PartialEq)]
pub struct BinanceConfig {
    pub market: MarketType,
    pub ws_url: String,
}

impl BinanceConfig {
    pub fn spot() -> Self {
        Self {
            market: MarketType::Spot,
            ws_url: SPOT_WS_URL.to_string(),
        }
    }

    pub fn futures() -> Self {
        Self {
            market: MarketType::Futures,
            ws_url: FUTURES_WS_URL.to_string(),
        }
    }

    /// `None` for markets Binance has no stream for here
    pub fn for_market(market: MarketType) -> Option<Self> {
        match market {
            MarketType::Spot => Some(Self::spot()),
            MarketType::Futures => Some(Self::futures()),
            _ => None,
        }
    }
}
