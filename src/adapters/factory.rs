//! Adapter factory for configured sources
//!
//! Creates `SourceAdapter` instances from `SourceConfig` entries.
//! Uses an enum-based dispatch pattern (no `Box<dyn>`) to preserve monomorphization.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::adapters::binance::{BinanceAdapter, BinanceConfig, BinanceProtocol};
use crate::adapters::bitget::{
    BitgetAdapter, BitgetConfig, BitgetPollingAdapter, BitgetProtocol, BitgetSnapshot,
};
use crate::adapters::bybit::{BybitAdapter, BybitConfig, BybitProtocol};
use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::gateio::{
    GateioAdapter, GateioConfig, GateioPollingAdapter, GateioProtocol, GateioSnapshot,
};
use crate::adapters::kucoin::{KucoinAdapter, KucoinProtocol};
use crate::adapters::mexc::{MexcAdapter, MexcConfig, MexcPollingAdapter, MexcProtocol, MexcSnapshot};
use crate::adapters::okx::{OkxAdapter, OkxProtocol};
use crate::adapters::shared::RetryPolicy;
use crate::adapters::traits::SourceAdapter;
use crate::adapters::types::{AdapterStatus, TickerCallback};
use crate::adapters::upbit::{UpbitAdapter, UpbitProtocol};
use crate::config::{ReconnectConfig, SourceConfig, Transport};
use crate::core::rates::RateProvider;
use crate::core::types::{Exchange, MarketType};

// =============================================================================
// AnyAdapter
// =============================================================================

/// Enum wrapping all concrete adapter types for runtime dispatch.
pub enum AnyAdapter {
    Upbit(UpbitAdapter),
    Binance(BinanceAdapter),
    Bybit(BybitAdapter),
    Okx(OkxAdapter),
    Bitget(BitgetAdapter),
    BitgetRest(BitgetPollingAdapter),
    Gateio(GateioAdapter),
    GateioRest(GateioPollingAdapter),
    Kucoin(KucoinAdapter),
    Mexc(MexcAdapter),
    MexcRest(MexcPollingAdapter),
}

/// Macro to reduce boilerplate for delegating trait methods
macro_rules! delegate {
    ($self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            AnyAdapter::Upbit(a) => a.$method($($arg),*),
            AnyAdapter::Binance(a) => a.$method($($arg),*),
            AnyAdapter::Bybit(a) => a.$method($($arg),*),
            AnyAdapter::Okx(a) => a.$method($($arg),*),
            AnyAdapter::Bitget(a) => a.$method($($arg),*),
            AnyAdapter::BitgetRest(a) => a.$method($($arg),*),
            AnyAdapter::Gateio(a) => a.$method($($arg),*),
            AnyAdapter::GateioRest(a) => a.$method($($arg),*),
            AnyAdapter::Kucoin(a) => a.$method($($arg),*),
            AnyAdapter::Mexc(a) => a.$method($($arg),*),
            AnyAdapter::MexcRest(a) => a.$method($($arg),*),
        }
    };
    (await $self:expr, $method:ident ( $($arg:expr),* )) => {
        match $self {
            AnyAdapter::Upbit(a) => a.$method($($arg),*).await,
            AnyAdapter::Binance(a) => a.$method($($arg),*).await,
            AnyAdapter::Bybit(a) => a.$method($($arg),*).await,
            AnyAdapter::Okx(a) => a.$method($($arg),*).await,
            AnyAdapter::Bitget(a) => a.$method($($arg),*).await,
            AnyAdapter::BitgetRest(a) => a.$method($($arg),*).await,
            AnyAdapter::Gateio(a) => a.$method($($arg),*).await,
            AnyAdapter::GateioRest(a) => a.$method($($arg),*).await,
            AnyAdapter::Kucoin(a) => a.$method($($arg),*).await,
            AnyAdapter::Mexc(a) => a.$method($($arg),*).await,
            AnyAdapter::MexcRest(a) => a.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl SourceAdapter for AnyAdapter {
    fn exchange(&self) -> Exchange {
        delegate!(self, exchange())
    }

    fn market_type(&self) -> MarketType {
        delegate!(self, market_type())
    }

    async fn connect(&mut self) -> ExchangeResult<()> {
        delegate!(await self, connect())
    }

    async fn subscribe(&mut self, symbols: &[String]) -> ExchangeResult<()> {
        delegate!(await self, subscribe(symbols))
    }

    fn on_ticker(&mut self, callback: TickerCallback) {
        delegate!(self, on_ticker(callback))
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        delegate!(await self, disconnect())
    }

    fn status(&self) -> AdapterStatus {
        delegate!(self, status())
    }
}

// =============================================================================
// Factory Functions
// =============================================================================

/// Every (exchange, market, transport) combination with an adapter
pub const SUPPORTED_SOURCES: &[(Exchange, MarketType, Transport)] = &[
    (Exchange::Upbit, MarketType::Spot, Transport::Stream),
    (Exchange::Binance, MarketType::Spot, Transport::Stream),
    (Exchange::Binance, MarketType::Futures, Transport::Stream),
    (Exchange::Bybit, MarketType::Spot, Transport::Stream),
    (Exchange::Bybit, MarketType::Perpetual, Transport::Stream),
    (Exchange::Okx, MarketType::Spot, Transport::Stream),
    (Exchange::Bitget, MarketType::Spot, Transport::Stream),
    (Exchange::Bitget, MarketType::Spot, Transport::Polling),
    (Exchange::Gateio, MarketType::Spot, Transport::Stream),
    (Exchange::Gateio, MarketType::Spot, Transport::Polling),
    (Exchange::Kucoin, MarketType::Spot, Transport::Stream),
    (Exchange::Mexc, MarketType::Spot, Transport::Stream),
    (Exchange::Mexc, MarketType::Spot, Transport::Polling),
];

pub fn is_supported(source: &SourceConfig) -> bool {
    SUPPORTED_SOURCES
        .iter()
        .any(|(exchange, market, transport)| {
            *exchange == source.exchange && *market == source.market && *transport == source.transport
        })
}

/// Create an adapter for one configured source.
///
/// The adapter is created but NOT connected; call `connect()` after.
pub fn create_adapter(
    source: &SourceConfig,
    rates: Arc<RateProvider>,
    reconnect: &ReconnectConfig,
) -> ExchangeResult<AnyAdapter> {
    let retry = RetryPolicy::from(reconnect);
    let interval = Duration::from_millis(source.poll_interval_ms);

    let adapter = match (source.exchange, source.market, source.transport) {
        (Exchange::Upbit, MarketType::Spot, Transport::Stream) => {
            AnyAdapter::Upbit(UpbitAdapter::new(UpbitProtocol::default(), rates, retry))
        }
        (Exchange::Binance, market, Transport::Stream) => {
            let config = BinanceConfig::for_market(market).ok_or_else(|| unsupported(source))?;
            AnyAdapter::Binance(BinanceAdapter::new(BinanceProtocol::new(config), rates, retry))
        }
        (Exchange::Bybit, market, Transport::Stream) => {
            let config = BybitConfig::for_market(market).ok_or_else(|| unsupported(source))?;
            AnyAdapter::Bybit(BybitAdapter::new(BybitProtocol::new(config), rates, retry))
        }
        (Exchange::Okx, MarketType::Spot, Transport::Stream) => {
            AnyAdapter::Okx(OkxAdapter::new(OkxProtocol::default(), rates, retry))
        }
        (Exchange::Bitget, MarketType::Spot, Transport::Stream) => AnyAdapter::Bitget(
            BitgetAdapter::new(BitgetProtocol::new(BitgetConfig::default()), rates, retry),
        ),
        (Exchange::Bitget, MarketType::Spot, Transport::Polling) => {
            AnyAdapter::BitgetRest(BitgetPollingAdapter::new(
                BitgetSnapshot::new(BitgetConfig::default()),
                rates,
                interval,
                retry,
            ))
        }
        (Exchange::Gateio, MarketType::Spot, Transport::Stream) => AnyAdapter::Gateio(
            GateioAdapter::new(GateioProtocol::new(GateioConfig::default()), rates, retry),
        ),
        (Exchange::Gateio, MarketType::Spot, Transport::Polling) => {
            AnyAdapter::GateioRest(GateioPollingAdapter::new(
                GateioSnapshot::new(GateioConfig::default()),
                rates,
                interval,
                retry,
            ))
        }
        (Exchange::Kucoin, MarketType::Spot, Transport::Stream) => {
            AnyAdapter::Kucoin(KucoinAdapter::new(KucoinProtocol::default(), rates, retry))
        }
        (Exchange::Mexc, MarketType::Spot, Transport::Stream) => AnyAdapter::Mexc(
            MexcAdapter::new(MexcProtocol::new(MexcConfig::default()), rates, retry),
        ),
        (Exchange::Mexc, MarketType::Spot, Transport::Polling) => {
            AnyAdapter::MexcRest(MexcPollingAdapter::new(
                MexcSnapshot::new(MexcConfig::default()),
                rates,
                interval,
                retry,
            ))
        }
        _ => return Err(unsupported(source)),
    };
    Ok(adapter)
}

fn unsupported(source: &SourceConfig) -> ExchangeError {
    ExchangeError::UnsupportedSource(format!("{} ({:?})", source.label(), source.transport))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> Arc<RateProvider> {
        Arc::new(RateProvider::fixed(1380.0, 0.998))
    }

    #[tokio::test]
    async fn test_every_supported_source_builds() {
        for (exchange, market, transport) in SUPPORTED_SOURCES {
            let source = SourceConfig {
                exchange: *exchange,
                market: *market,
                transport: *transport,
                poll_interval_ms: 1_000,
            };
            let adapter = create_adapter(&source, rates(), &ReconnectConfig::default())
                .unwrap_or_else(|e| panic!("{} should build: {}", source.label(), e));
            assert_eq!(adapter.exchange(), *exchange);
            assert_eq!(adapter.market_type(), *market);
            assert!(!adapter.status().connected);
        }
    }

    #[tokio::test]
    async fn test_polling_variant_selected() {
        let source = SourceConfig::polling(Exchange::Mexc, MarketType::Spot);
        let adapter = create_adapter(&source, rates(), &ReconnectConfig::default()).unwrap();
        assert!(matches!(adapter, AnyAdapter::MexcRest(_)));

        let source = SourceConfig::stream(Exchange::Mexc, MarketType::Spot);
        let adapter = create_adapter(&source, rates(), &ReconnectConfig::default()).unwrap();
        assert!(matches!(adapter, AnyAdapter::Mexc(_)));
    }

    #[test]
    fn test_unsupported_combinations() {
        let cases = [
            SourceConfig::stream(Exchange::Upbit, MarketType::Futures),
            SourceConfig::polling(Exchange::Binance, MarketType::Spot),
            SourceConfig::stream(Exchange::Okx, MarketType::Swap),
            SourceConfig::polling(Exchange::Kucoin, MarketType::Spot),
        ];
        for source in &cases {
            assert!(!is_supported(source), "{}", source.label());
            let result = create_adapter(source, rates(), &ReconnectConfig::default());
            assert!(matches!(result, Err(ExchangeError::UnsupportedSource(_))));
        }
    }

    #[test]
    fn test_default_sources_are_supported() {
        let config = crate::config::AppConfig::default();
        assert!(config.sources.iter().all(is_supported));
    }
}
