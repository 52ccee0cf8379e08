//! FX rate provider for KRW conversion
//!
//! Adapters quoting in USDT or USD convert to KRW through this provider
//! before a ticker leaves the adapter.
//!
//! # Architecture
//! - Rates stored as AtomicU64 micros (rate × 1_000_000) for lock-free reads
//! - `fetch_rates`: one lookup; failures keep the previous value
//! - USDT/KRW is derived from USD/KRW with a fixed ratio
//! - `spawn_rate_refresh_task`: optional periodic refresh

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::config::RatesConfig;
use crate::core::types::QuoteCurrency;

/// HTTP timeout for the rate lookup
const FETCH_TIMEOUT_SECS: u64 = 5;

/// Accepted USD/KRW range; anything outside is treated as a bad response
const RATE_MIN: f64 = 100.0;
const RATE_MAX: f64 = 100_000.0;

/// Rate change threshold for WARN logging (2%)
const RATE_CHANGE_WARN_THRESHOLD: f64 = 0.02;

const RATE_MULTIPLIER: f64 = 1_000_000.0;

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: LatestRates,
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(rename = "KRW")]
    krw: Option<f64>,
}

/// Rate pairs the provider tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyPair {
    UsdKrw,
    UsdtKrw,
}

/// Both rates at one point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSnapshot {
    pub usd_krw: f64,
    pub usdt_krw: f64,
}

/// Thread-safe holder of the current KRW rates
#[derive(Debug)]
pub struct RateProvider {
    usd_krw_micros: AtomicU64,
    usdt_ratio: f64,
    url: String,
    client: reqwest::Client,
}

impl Default for RateProvider {
    fn default() -> Self {
        Self::new(&RatesConfig::default())
    }
}

impl RateProvider {
    pub fn new(config: &RatesConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            usd_krw_micros: AtomicU64::new(to_micros(config.default_usd_krw)),
            usdt_ratio: config.usdt_ratio,
            url: config.url.clone(),
            client,
        }
    }

    /// Provider with fixed rates and no usable endpoint, for tests
    pub fn fixed(usd_krw: f64, usdt_ratio: f64) -> Self {
        Self::new(&RatesConfig {
            url: String::new(),
            default_usd_krw: usd_krw,
            usdt_ratio,
            refresh_interval_secs: 0,
        })
    }

    pub fn rate(&self, pair: CurrencyPair) -> f64 {
        let usd_krw = self.usd_krw_micros.load(Ordering::Relaxed) as f64 / RATE_MULTIPLIER;
        match pair {
            CurrencyPair::UsdKrw => usd_krw,
            CurrencyPair::UsdtKrw => usd_krw * self.usdt_ratio,
        }
    }

    pub fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            usd_krw: self.rate(CurrencyPair::UsdKrw),
            usdt_krw: self.rate(CurrencyPair::UsdtKrw),
        }
    }

    /// Convert a venue price into KRW
    pub fn convert_to_krw(&self, price: f64, quote: QuoteCurrency) -> f64 {
        match quote {
            QuoteCurrency::Krw => price,
            QuoteCurrency::Usdt => price * self.rate(CurrencyPair::UsdtKrw),
            QuoteCurrency::Usd => price * self.rate(CurrencyPair::UsdKrw),
        }
    }

    /// Store a new USD/KRW rate.
    ///
    /// Returns `false` (and keeps the old value) when the rate is out of bounds.
    pub fn update_usd_krw(&self, new_rate: f64) -> bool {
        if !new_rate.is_finite() || !(RATE_MIN..=RATE_MAX).contains(&new_rate) {
            tracing::warn!(
                new_rate = %new_rate,
                bounds = %format!("[{}, {}]", RATE_MIN, RATE_MAX),
                "USD/KRW rate rejected: out of bounds"
            );
            return false;
        }

        let old_rate = self.rate(CurrencyPair::UsdKrw);
        self.usd_krw_micros.store(to_micros(new_rate), Ordering::Relaxed);

        if old_rate > 0.0 {
            let change = ((new_rate - old_rate) / old_rate).abs();
            if change > RATE_CHANGE_WARN_THRESHOLD {
                tracing::warn!(
                    old_rate = %format!("{:.2}", old_rate),
                    new_rate = %format!("{:.2}", new_rate),
                    change_pct = %format!("{:.2}%", change * 100.0),
                    "USD/KRW rate significant change detected"
                );
            }
        }

        true
    }

    /// Fetch the current USD/KRW rate from the configured endpoint
    pub async fn fetch_usd_krw(&self) -> ExchangeResult<f64> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(ExchangeError::InvalidResponse(format!(
                "rate API returned {}",
                response.status()
            )));
        }

        let body: LatestRatesResponse = response.json().await?;
        body.rates
            .krw
            .ok_or_else(|| ExchangeError::InvalidResponse("no KRW rate in response".to_string()))
    }

    /// One rate lookup. Never fails: on any error the previous rate stays.
    pub async fn fetch_rates(&self) -> RateSnapshot {
        match self.fetch_usd_krw().await {
            Ok(rate) => {
                if self.update_usd_krw(rate) {
                    tracing::info!(
                        usd_krw = %format!("{:.2}", rate),
                        usdt_krw = %format!("{:.2}", self.rate(CurrencyPair::UsdtKrw)),
                        "Exchange rates updated"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    usd_krw = %format!("{:.2}", self.rate(CurrencyPair::UsdKrw)),
                    "Rate fetch failed, keeping current rate"
                );
            }
        }
        self.snapshot()
    }
}

fn to_micros(rate: f64) -> u64 {
    (rate * RATE_MULTIPLIER).max(0.0) as u64
}

/// Spawn a background task refreshing rates every `interval`
pub fn spawn_rate_refresh_task(
    rates: Arc<RateProvider>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // skip first immediate tick

        loop {
            ticker.tick().await;
            rates.fetch_rates().await;
        }
    })
}
