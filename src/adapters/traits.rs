//! Source adapter trait definition
//!
//! Every venue/market combination implements `SourceAdapter`. The manager
//! only talks to adapters through this trait.

use async_trait::async_trait;

use crate::adapters::errors::ExchangeResult;
use crate::adapters::types::{AdapterStatus, TickerCallback};
use crate::core::types::{Exchange, MarketType};

/// Common trait for all source adapters
///
/// Lifecycle: `on_ticker` → `connect` → `subscribe` → ... → `disconnect`.
/// `subscribe` may be called before `connect`; the interest set is sent
/// once the transport is up.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn exchange(&self) -> Exchange;

    fn market_type(&self) -> MarketType;

    /// Establish the transport.
    ///
    /// Socket adapters resolve once the first handshake is done, or once it
    /// failed transiently and the session went on retrying in the
    /// background. Polling adapters resolve immediately. Fails only for
    /// unrecoverable setup errors.
    async fn connect(&mut self) -> ExchangeResult<()>;

    /// Replace the interest set with `symbols` (canonical, e.g. "BTC").
    async fn subscribe(&mut self, symbols: &[String]) -> ExchangeResult<()>;

    /// Register the single ticker sink, replacing any previous one
    fn on_ticker(&mut self, callback: TickerCallback);

    /// Release transport, timers and tasks. Idempotent.
    async fn disconnect(&mut self) -> ExchangeResult<()>;

    fn status(&self) -> AdapterStatus;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_utils::MockSource;
    use crate::core::types::NormalizedTicker;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_mock_lifecycle() {
        let mut adapter = MockSource::new(Exchange::Okx, MarketType::Spot);
        assert!(!adapter.status().connected);

        adapter.connect().await.unwrap();
        adapter.subscribe(&["BTC".to_string()]).await.unwrap();
        let status = adapter.status();
        assert!(status.connected);
        assert_eq!(status.subscribed_symbols, 1);

        adapter.disconnect().await.unwrap();
        adapter.disconnect().await.unwrap();
        assert!(!adapter.status().connected);
    }

    #[tokio::test]
    async fn test_mock_emits_through_callback() {
        let mut adapter = MockSource::new(Exchange::Okx, MarketType::Spot);
        let seen: Arc<Mutex<Vec<NormalizedTicker>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        adapter.on_ticker(Arc::new(move |t| sink.lock().unwrap().push(t)));
        adapter.subscribe(&["BTC".to_string()]).await.unwrap();

        assert!(adapter.push("BTC", 50_000.0));
        assert!(!adapter.push("ETH", 3_000.0));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].exchange, Exchange::Okx);
    }
}
