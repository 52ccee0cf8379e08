//! Bybit Configuration

use std::time::Duration;

use crate::core::types::MarketType;

const SPOT_WS_URL: &str = "wss://stream.bybit.com/v5/public/spot";
const LINEAR_WS_URL: &str = "wss://stream.bybit.com/v5/public/linear";

/// Bybit drops idle public connections after 30s without a ping
pub const PING_INTERVAL: Duration = Duration::from_secs(20);

/// Max topics per subscribe request on spot
pub const SUBSCRIBE_BATCH_SIZE: usize = 10;

/// Configuration for one Bybit public stream
#[derive(Debug, Clone, PartialEq)]
pub struct BybitConfig {
    pub market: MarketType,
    pub ws_url: String,
}

impl BybitConfig {
    pub fn spot() -> Self {
        Self {
            market: MarketType::Spot,
            ws_url: SPOT_WS_URL.to_string(),
        }
    }

    /// USDT linear perpetuals, which carry funding and open interest
    pub fn perpetual() -> Self {
        Self {
            market: MarketType::Perpetual,
            ws_url: LINEAR_WS_URL.to_string(),
        }
    }

    pub fn for_market(market: MarketType) -> Option<Self> {
        match market {
            MarketType::Spot => Some(Self::spot()),
            MarketType::Perpetual => Some(Self::perpetual()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_market() {
        assert_eq!(BybitConfig::for_market(MarketType::Spot).unwrap().ws_url, SPOT_WS_URL);
        assert_eq!(
            BybitConfig::for_market(MarketType::Perpetual).unwrap().ws_url,
            LINEAR_WS_URL
        );
        assert!(BybitConfig::for_market(MarketType::Futures).is_none());
    }
}
