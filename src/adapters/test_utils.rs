//! Shared test utilities for adapter testing
//!
//! `MockSource` is an in-memory adapter backed by a real `SourceCore`, so
//! interest filtering, status and the callback path behave like production
//! adapters.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::traits::SourceAdapter;
use crate::adapters::types::{AdapterStatus, RawQuote, SourceCore, TickerCallback};
use crate::core::rates::RateProvider;
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

pub struct MockSource {
    core: SourceCore,
    /// When true, `connect` fails
    pub fail_connect: bool,
    pub connect_calls: Arc<AtomicUsize>,
    pub disconnect_calls: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn new(exchange: Exchange, market_type: MarketType) -> Self {
        Self {
            core: SourceCore::new(
                exchange,
                market_type,
                QuoteCurrency::Krw,
                Arc::new(RateProvider::default()),
            ),
            fail_connect: false,
            connect_calls: Arc::new(AtomicUsize::new(0)),
            disconnect_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(exchange: Exchange, market_type: MarketType) -> Self {
        let mut mock = Self::new(exchange, market_type);
        mock.fail_connect = true;
        mock
    }

    /// Handle for pushing quotes after the mock moved into a manager
    pub fn core(&self) -> SourceCore {
        self.core.clone()
    }

    /// Simulate a KRW quote arriving from the venue
    pub fn push(&self, symbol: &str, last: f64) -> bool {
        self.core.emit(RawQuote::new(symbol, last))
    }
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn exchange(&self) -> Exchange {
        self.core.exchange()
    }

    fn market_type(&self) -> MarketType {
        self.core.market_type()
    }

    async fn connect(&mut self) -> ExchangeResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(ExchangeError::ConnectionFailed("mock refused".to_string()));
        }
        self.core.set_connected(true);
        Ok(())
    }

    async fn subscribe(&mut self, symbols: &[String]) -> ExchangeResult<()> {
        self.core.replace_interest(symbols);
        Ok(())
    }

    fn on_ticker(&mut self, callback: TickerCallback) {
        self.core.set_callback(callback);
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.core.set_connected(false);
        Ok(())
    }

    fn status(&self) -> AdapterStatus {
        self.core.status()
    }
}
