//! Ticker pipeline: the single writer of the price store and gap history.
//!
//! Every adapter callback feeds one `mpsc` channel. The pipeline task
//! drains it into the `PriceStore`, releases accepted tickers as one
//! `PriceBatch` per flush interval, and periodically appends significant
//! gaps to the `GapHistoryLog`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::types::TickerCallback;
use crate::config::AppConfig;
use crate::core::gaps::detect_gaps;
use crate::core::history::GapHistoryLog;
use crate::core::price_store::{PriceStore, UpdateOutcome};
use crate::core::types::{current_time_ms, BroadcastEvent, NormalizedTicker};

/// Capacity of the adapter → pipeline channel
pub const TICKER_CHANNEL_CAPACITY: usize = 8_192;

/// Every Nth dropped tick is logged
const DROP_LOG_SAMPLE: u64 = 1_000;

/// Build the callback every adapter shares. Never blocks the adapter task;
/// ticks are dropped when the pipeline falls behind and counted in `dropped`
/// (see `PriceStore::drop_counter`).
pub fn ticker_sink(tx: mpsc::Sender<NormalizedTicker>, dropped: Arc<AtomicU64>) -> TickerCallback {
    Arc::new(move |ticker: NormalizedTicker| {
        if let Err(e) = tx.try_send(ticker) {
            let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if total % DROP_LOG_SAMPLE == 1 {
                warn!(dropped = total, error = %e, "Pipeline channel rejected ticker");
            }
        }
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub flush_interval: Duration,
    pub snapshot_interval: Duration,
    /// Gaps at or above this spread (percent) go into the history
    pub min_spread_percent: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl PipelineConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            flush_interval: Duration::from_millis(config.broadcast.flush_interval_ms.max(1)),
            snapshot_interval: Duration::from_secs(config.history.snapshot_interval_secs.max(1)),
            min_spread_percent: config.history.min_spread_percent,
        }
    }
}

pub struct TickerPipeline {
    store: Arc<RwLock<PriceStore>>,
    history: Arc<RwLock<GapHistoryLog>>,
    event_tx: broadcast::Sender<BroadcastEvent>,
    config: PipelineConfig,
    pending: Vec<NormalizedTicker>,
    processed: u64,
}

impl TickerPipeline {
    pub fn new(
        store: Arc<RwLock<PriceStore>>,
        history: Arc<RwLock<GapHistoryLog>>,
        event_tx: broadcast::Sender<BroadcastEvent>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            history,
            event_tx,
            config,
            pending: Vec::new(),
            processed: 0,
        }
    }

    /// Store one ticker; accepted tickers are queued for the next flush
    pub async fn process(&mut self, ticker: NormalizedTicker) -> UpdateOutcome {
        self.processed += 1;
        let outcome = self.store.write().await.update(ticker.clone());
        if outcome == UpdateOutcome::Stored {
            self.pending.push(ticker);
        }
        outcome
    }

    /// Release queued tickers as one batch. The batch is discarded when
    /// nobody is listening. Returns the batch size.
    pub fn flush(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let batch = std::mem::take(&mut self.pending);
        let size = batch.len();
        if self.event_tx.receiver_count() > 0 {
            let _ = self.event_tx.send(BroadcastEvent::PriceBatch(batch));
        }
        size
    }

    /// Detect gaps over the current store and record the significant ones
    pub async fn record_history(&self, timestamp: u64) -> usize {
        let snapshot = self.store.read().await.snapshot_all();
        let gaps = detect_gaps(&snapshot);

        let (recorded, total) = {
            let mut history = self.history.write().await;
            let recorded =
                history.record_significant(&gaps, self.config.min_spread_percent, timestamp);
            (recorded, history.count())
        };

        if recorded > 0 {
            info!(recorded, total, "Gap history snapshot saved");
            if self.event_tx.receiver_count() > 0 {
                let _ = self
                    .event_tx
                    .send(BroadcastEvent::HistorySnapshot { recorded, total });
            }
        } else {
            debug!(gaps = gaps.len(), "No significant gaps in snapshot");
        }
        recorded
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Drive the pipeline until the channel closes or `cancel` fires
    pub async fn run(mut self, mut rx: mpsc::Receiver<NormalizedTicker>, cancel: CancellationToken) {
        let mut flush = interval_at(
            Instant::now() + self.config.flush_interval,
            self.config.flush_interval,
        );
        flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut snapshot = interval_at(
            Instant::now() + self.config.snapshot_interval,
            self.config.snapshot_interval,
        );
        snapshot.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            flush_ms = self.config.flush_interval.as_millis() as u64,
            snapshot_secs = self.config.snapshot_interval.as_secs(),
            "Ticker pipeline started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = rx.recv() => match received {
                    Some(ticker) => {
                        self.process(ticker).await;
                    }
                    None => {
                        info!("Ticker channel closed, pipeline shutting down");
                        break;
                    }
                },
                _ = flush.tick() => {
                    self.flush();
                }
                _ = snapshot.tick() => {
                    self.record_history(current_time_ms()).await;
                }
            }
        }

        self.flush();
        info!(processed = self.processed, "Ticker pipeline stopped");
    }
}
