//! Generic REST polling adapter
//!
//! `PollingAdapter<V>` fetches a venue's full ticker snapshot every
//! interval and filters it client-side against the interest set.
//! Consecutive poll failures are bounded by the same `RetryPolicy` the
//! socket adapters use; a successful poll resets it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::reconnect::RetryPolicy;
use crate::adapters::traits::SourceAdapter;
use crate::adapters::types::{create_http_client, AdapterStatus, RawQuote, SourceCore, TickerCallback};
use crate::core::rates::RateProvider;
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

/// Venue-specific half of a polling adapter
pub trait SnapshotVenue: Send + Sync + 'static {
    fn exchange(&self) -> Exchange;

    fn market_type(&self) -> MarketType;

    fn quote_currency(&self) -> QuoteCurrency;

    /// Full-market ticker snapshot URL
    fn snapshot_url(&self) -> String;

    /// Parse the snapshot body into canonical quotes
    fn parse_snapshot(&self, body: &str) -> ExchangeResult<Vec<RawQuote>>;
}

/// Floor for the poll period; a zero period would spin on the venue
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Polling adapter driven by a `SnapshotVenue`
pub struct PollingAdapter<V: SnapshotVenue> {
    venue: Arc<V>,
    core: SourceCore,
    client: reqwest::Client,
    interval: Duration,
    retry: RetryPolicy,
    task: Option<PollTask>,
}

impl<V: SnapshotVenue> PollingAdapter<V> {
    pub fn new(venue: V, rates: Arc<RateProvider>, interval: Duration, retry: RetryPolicy) -> Self {
        let core = SourceCore::new(venue.exchange(), venue.market_type(), venue.quote_currency(), rates);
        let client = create_http_client(venue.exchange());
        if interval < MIN_POLL_INTERVAL {
            warn!(
                exchange = %venue.exchange(),
                requested_ms = interval.as_millis() as u64,
                min_ms = MIN_POLL_INTERVAL.as_millis() as u64,
                "Poll interval raised to minimum"
            );
        }
        Self {
            venue: Arc::new(venue),
            core,
            client,
            interval: interval.max(MIN_POLL_INTERVAL),
            retry,
            task: None,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.handle.is_finished())
    }
}

#[async_trait]
impl<V: SnapshotVenue> SourceAdapter for PollingAdapter<V> {
    fn exchange(&self) -> Exchange {
        self.core.exchange()
    }

    fn market_type(&self) -> MarketType {
        self.core.market_type()
    }

    async fn connect(&mut self) -> ExchangeResult<()> {
        if self.is_polling() {
            return Ok(());
        }

        self.core.set_connected(true);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.venue),
            self.core.clone(),
            self.client.clone(),
            self.interval,
            self.retry.clone(),
            cancel.clone(),
        ));
        self.task = Some(PollTask { cancel, handle });

        info!(
            exchange = %self.core.exchange(),
            market = %self.core.market_type(),
            interval_ms = self.interval.as_millis() as u64,
            "Polling started"
        );
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
        if let Some(task) = self.task.take() {
            task.cancel.cancel();
            task.handle.abort();
            info!(exchange = %self.core.exchange(), "Polling stopped");
        }
        self.core.set_connected(false);
        Ok(())
    }

    fn status(&self) -> AdapterStatus {
        self.core.status()
    }
}

impl<V: SnapshotVenue> Drop for PollingAdapter<V> {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.cancel.cancel();
        }
    }
}

/// Fetch and parse one snapshot
pub async fn fetch_snapshot<V: SnapshotVenue>(
    venue: &V,
    client: &reqwest::Client,
) -> ExchangeResult<Vec<RawQuote>> {
    let response = client.get(venue.snapshot_url()).send().await?;
    if !response.status().is_success() {
        return Err(ExchangeError::InvalidResponse(format!(
            "snapshot returned {}",
            response.status()
        )));
    }
    let body = response.text().await?;
    venue.parse_snapshot(&body)
}

async fn poll_loop<V: SnapshotVenue>(
    venue: Arc<V>,
    core: SourceCore,
    client: reqwest::Client,
    interval: Duration,
    mut retry: RetryPolicy,
    cancel: CancellationToken,
) {
    let exchange = core.exchange();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        match fetch_snapshot(&*venue, &client).await {
            Ok(quotes) => {
                retry.reset();
                if !core.is_connected() {
                    core.set_connected(true);
                    info!(exchange = %exchange, "Polling recovered");
                }
                let emitted = quotes
                    .into_iter()
                    .map(|quote| core.emit(quote))
                    .filter(|emitted| *emitted)
                    .count();
                debug!(exchange = %exchange, emitted, "Snapshot processed");
            }
            Err(e) => {
                core.set_connected(false);
                match retry.next_delay() {
                    Some(delay) => {
                        warn!(
                            exchange = %exchange,
                            error = %e,
                            attempt = retry.attempts(),
                            max_attempts = retry.max_attempts(),
                            "Snapshot poll failed"
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => return,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    None => {
                        error!(exchange = %exchange, error = %e, "Poll failures exhausted, adapter stays disconnected");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::types::{parse_decimal, SymbolFormat};
    use crate::core::types::NormalizedTicker;
    use serde::Deserialize;
    use tokio::sync::mpsc;

    #[derive(Deserialize)]
    struct Row {
        symbol: String,
        price: String,
    }

    struct TestVenue {
        url: String,
    }

    impl SnapshotVenue for TestVenue {
        fn exchange(&self) -> Exchange {
            Exchange::Mexc
        }

        fn market_type(&self) -> MarketType {
            MarketType::Spot
        }

        fn quote_currency(&self) -> QuoteCurrency {
            QuoteCurrency::Usdt
        }

        fn snapshot_url(&self) -> String {
            self.url.clone()
        }

        fn parse_snapshot(&self, body: &str) -> ExchangeResult<Vec<RawQuote>> {
            let rows: Vec<Row> = serde_json::from_str(body)
                .map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;
            let format = SymbolFormat::Concat { quote: "USDT" };
            Ok(rows
                .into_iter()
                .filter_map(|row| {
                    Some(RawQuote::new(format.to_canonical(&row.symbol)?, parse_decimal(&row.price)?))
                })
                .collect())
        }
    }

    fn adapter_with_interval(url: String, interval: Duration, attempts: u32) -> PollingAdapter<TestVenue> {
        PollingAdapter::new(
            TestVenue { url },
            Arc::new(RateProvider::fixed(1000.0, 1.0)),
            interval,
            RetryPolicy::new(Duration::from_millis(10), attempts),
        )
    }

    fn adapter(url: String, attempts: u32) -> PollingAdapter<TestVenue> {
        adapter_with_interval(url, Duration::from_millis(50), attempts)
    }

    #[tokio::test]
    async fn test_polling_filters_and_emits() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/ticker")
            .with_status(200)
            .with_body(
                r#"[{"symbol":"BTCUSDT","price":"100"},{"symbol":"ETHUSDT","price":"5"},{"symbol":"BTCUSDC","price":"99"}]"#,
            )
            .expect_at_least(1)
            .create_async()
            .await;

        let mut adapter = adapter(format!("{}/ticker", server.url()), 3);
        let (tx, mut rx) = mpsc::unbounded_channel::<NormalizedTicker>();
        adapter.on_ticker(Arc::new(move |t| {
            let _ = tx.send(t);
        }));
        adapter.subscribe(&["BTC".to_string()]).await.unwrap();
        adapter.connect().await.unwrap();
        assert!(adapter.status().connected);

        let ticker = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticker.symbol, "BTC");
        assert!((ticker.last - 100_000.0).abs() < 1e-6);

        adapter.disconnect().await.unwrap();
        adapter.disconnect().await.unwrap();
        assert!(!adapter.status().connected);
        assert!(!adapter.is_polling());
    }

    #[tokio::test]
    async fn test_polling_gives_up_after_failures() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/ticker")
            .with_status(500)
            .expect_at_least(1)
            .create_async()
            .await;

        let mut adapter = adapter(format!("{}/ticker", server.url()), 2);
        adapter.connect().await.unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while adapter.is_polling() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!adapter.is_polling());
        assert!(!adapter.status().connected);
    }

    #[tokio::test]
    async fn test_zero_interval_is_raised_to_minimum() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/ticker")
            .with_status(200)
            .with_body(r#"[{"symbol":"ETHUSDT","price":"5"}]"#)
            .expect_at_least(1)
            .create_async()
            .await;

        let mut adapter = adapter_with_interval(format!("{}/ticker", server.url()), Duration::ZERO, 3);
        assert_eq!(adapter.interval, MIN_POLL_INTERVAL);

        let (tx, mut rx) = mpsc::unbounded_channel::<NormalizedTicker>();
        adapter.on_ticker(Arc::new(move |t| {
            let _ = tx.send(t);
        }));
        adapter.subscribe(&["ETH".to_string()]).await.unwrap();
        adapter.connect().await.unwrap();

        let ticker = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticker.symbol, "ETH");
        assert!(adapter.is_polling());
        adapter.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_snapshot_rejects_bad_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/ticker")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let venue = TestVenue {
            url: format!("{}/ticker", server.url()),
        };
        let result = fetch_snapshot(&venue, &reqwest::Client::new()).await;
        assert!(matches!(result, Err(ExchangeError::InvalidResponse(_))));
    }
}
