//! Source manager: orchestrates multiple source adapters.
//!
//! Adapters are keyed by `(exchange, market_type)`. Every adapter's ticks
//! are re-emitted into one downstream sink, which may be registered before
//! or after the adapters themselves.

use std::collections::BTreeMap;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::adapters::factory::AnyAdapter;
use crate::adapters::traits::SourceAdapter;
use crate::adapters::types::{AdapterStatus, TickerCallback};
use crate::core::types::{Exchange, MarketType};

type SourceKey = (Exchange, MarketType);

/// Result of one adapter's connect attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectOutcome {
    pub exchange: Exchange,
    pub market_type: MarketType,
    pub error: Option<String>,
}

impl ConnectOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate health across adapters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerStatus {
    pub total_adapters: usize,
    pub connected_count: usize,
    pub adapters: Vec<AdapterStatus>,
}

/// Registry of source adapters.
pub struct SourceManager<A: SourceAdapter = AnyAdapter> {
    adapters: BTreeMap<SourceKey, A>,
    sink: Option<TickerCallback>,
}

impl<A: SourceAdapter> Default for SourceManager<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: SourceAdapter> SourceManager<A> {
    pub fn new() -> Self {
        Self {
            adapters: BTreeMap::new(),
            sink: None,
        }
    }

    /// Add an adapter. A second adapter for the same key is ignored.
    pub fn register(&mut self, mut adapter: A) -> bool {
        let key = (adapter.exchange(), adapter.market_type());
        if self.adapters.contains_key(&key) {
            warn!(
                exchange = %key.0,
                market = ?key.1,
                "Adapter already registered, ignoring duplicate"
            );
            return false;
        }
        if let Some(sink) = &self.sink {
            adapter.on_ticker(sink.clone());
        }
        self.adapters.insert(key, adapter);
        info!(exchange = %key.0, market = ?key.1, "Adapter registered");
        true
    }

    /// Connect every adapter concurrently. Failures are logged and isolated.
    pub async fn connect_all(&mut self) -> Vec<ConnectOutcome> {
        let attempts = self.adapters.iter_mut().map(|(&(exchange, market_type), adapter)| async move {
            let error = match adapter.connect().await {
                Ok(()) => {
                    info!(exchange = %exchange, market = ?market_type, "Connected");
                    None
                }
                Err(e) => {
                    error!(exchange = %exchange, market = ?market_type, error = %e, "Failed to connect");
                    Some(e.to_string())
                }
            };
            ConnectOutcome {
                exchange,
                market_type,
                error,
            }
        });
        let outcomes = join_all(attempts).await;

        let connected = outcomes.iter().filter(|o| o.is_ok()).count();
        info!(
            connected,
            total = outcomes.len(),
            "Connect round settled"
        );
        outcomes
    }

    /// Give every adapter the same symbol universe
    pub async fn subscribe_all(&mut self, symbols: &[String]) {
        let attempts = self.adapters.iter_mut().map(|(&(exchange, market_type), adapter)| async move {
            if let Err(e) = adapter.subscribe(symbols).await {
                warn!(
                    exchange = %exchange,
                    market = ?market_type,
                    error = %e,
                    "Failed to subscribe, skipping"
                );
            }
        });
        join_all(attempts).await;
        info!(symbols = symbols.len(), adapters = self.adapters.len(), "Subscribed all adapters");
    }

    /// Subscribe a single adapter. Returns false when it is not registered.
    pub async fn subscribe(
        &mut self,
        exchange: Exchange,
        market_type: MarketType,
        symbols: &[String],
    ) -> bool {
        let Some(adapter) = self.adapters.get_mut(&(exchange, market_type)) else {
            warn!(exchange = %exchange, market = ?market_type, "No adapter registered");
            return false;
        };
        if let Err(e) = adapter.subscribe(symbols).await {
            warn!(exchange = %exchange, market = ?market_type, error = %e, "Failed to subscribe");
            return false;
        }
        true
    }

    /// Register the downstream sink for every current and future adapter
    pub fn on_ticker(&mut self, callback: TickerCallback) {
        for adapter in self.adapters.values_mut() {
            adapter.on_ticker(callback.clone());
        }
        self.sink = Some(callback);
    }

    pub fn status(&self) -> ManagerStatus {
        let adapters: Vec<AdapterStatus> = self.adapters.values().map(|a| a.status()).collect();
        ManagerStatus {
            total_adapters: adapters.len(),
            connected_count: adapters.iter().filter(|s| s.connected).count(),
            adapters,
        }
    }

    /// Best-effort disconnect of every adapter
    pub async fn disconnect_all(&mut self) {
        for (&(exchange, market_type), adapter) in self.adapters.iter_mut() {
            if let Err(e) = adapter.disconnect().await {
                warn!(exchange = %exchange, market = ?market_type, error = %e, "Disconnect failed");
            }
        }
        info!(adapters = self.adapters.len(), "All adapters disconnected");
    }

    pub fn adapter(&self, exchange: Exchange, market_type: MarketType) -> Option<&A> {
        self.adapters.get(&(exchange, market_type))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_utils::MockSource;
    use crate::core::types::NormalizedTicker;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    fn collector() -> (TickerCallback, Arc<Mutex<Vec<NormalizedTicker>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: TickerCallback = Arc::new(move |t| sink.lock().unwrap().push(t));
        (callback, seen)
    }

    #[test]
    fn test_duplicate_registration_is_noop() {
        let mut manager = SourceManager::new();
        assert!(manager.register(MockSource::new(Exchange::Binance, MarketType::Spot)));
        assert!(!manager.register(MockSource::new(Exchange::Binance, MarketType::Spot)));
        assert!(manager.register(MockSource::new(Exchange::Binance, MarketType::Futures)));
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_connect_is_isolated() {
        let mut manager = SourceManager::new();
        manager.register(MockSource::new(Exchange::Upbit, MarketType::Spot));
        manager.register(MockSource::failing(Exchange::Okx, MarketType::Spot));
        manager.register(MockSource::new(Exchange::Bybit, MarketType::Spot));

        let outcomes = manager.connect_all().await;
        assert_eq!(outcomes.len(), 3);
        let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_ok()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].exchange, Exchange::Okx);

        let status = manager.status();
        assert_eq!(status.total_adapters, 3);
        assert_eq!(status.connected_count, 2);
    }

    #[tokio::test]
    async fn test_fan_in_reaches_single_sink() {
        let mut manager = SourceManager::new();
        let early = MockSource::new(Exchange::Upbit, MarketType::Spot);
        let early_core = early.core();
        manager.register(early);

        let (callback, seen) = collector();
        manager.on_ticker(callback);

        // registered after the sink
        let late = MockSource::new(Exchange::Bitget, MarketType::Spot);
        let late_core = late.core();
        manager.register(late);

        manager.subscribe_all(&["BTC".to_string()]).await;
        assert!(early_core.emit(crate::adapters::types::RawQuote::new("BTC", 90_000_000.0)));
        assert!(late_core.emit(crate::adapters::types::RawQuote::new("BTC", 90_100_000.0)));
        assert!(!late_core.emit(crate::adapters::types::RawQuote::new("ETH", 5_000_000.0)));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].exchange, Exchange::Upbit);
        assert_eq!(seen[1].exchange, Exchange::Bitget);
    }

    #[tokio::test]
    async fn test_targeted_subscribe() {
        let mut manager = SourceManager::new();
        manager.register(MockSource::new(Exchange::Gateio, MarketType::Spot));

        let symbols = vec!["BTC".to_string(), "ETH".to_string()];
        assert!(manager.subscribe(Exchange::Gateio, MarketType::Spot, &symbols).await);
        assert!(!manager.subscribe(Exchange::Kucoin, MarketType::Spot, &symbols).await);

        let adapter = manager.adapter(Exchange::Gateio, MarketType::Spot).unwrap();
        assert_eq!(adapter.status().subscribed_symbols, 2);
        assert!(manager.adapter(Exchange::Kucoin, MarketType::Spot).is_none());
    }

    #[tokio::test]
    async fn test_disconnect_all_reaches_every_adapter() {
        let mut manager = SourceManager::new();
        let a = MockSource::new(Exchange::Mexc, MarketType::Spot);
        let b = MockSource::new(Exchange::Kucoin, MarketType::Spot);
        let (calls_a, calls_b) = (a.disconnect_calls.clone(), b.disconnect_calls.clone());
        manager.register(a);
        manager.register(b);

        manager.connect_all().await;
        manager.disconnect_all().await;
        manager.disconnect_all().await;

        assert_eq!(calls_a.load(Ordering::SeqCst), 2);
        assert_eq!(calls_b.load(Ordering::SeqCst), 2);
        assert_eq!(manager.status().connected_count, 0);
    }
}
