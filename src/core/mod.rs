//! Core module - Price store, gap detection, history and the ticker pipeline
//!
//! # Module Architecture
//!
//! This module uses **explicit re-exports** instead of glob exports (`pub use module::*`)
//! to keep the public API visible in one place.
//!
//! ## Usage
//! Prefer importing from `crate::core`:
//! ```ignore
//! use crate::core::{PriceStore, detect_gaps, NormalizedTicker};
//! ```

pub mod gaps;
pub mod history;
pub mod pipeline;
pub mod price_store;
pub mod rates;
pub mod types;

pub use types::{
    current_time_ms, BroadcastEvent, Exchange, MarketType, NormalizedTicker, PriceTable,
    QuoteCurrency,
};

pub use gaps::{detect_gaps, sort_by_spread_desc, Gap, GapFilter, GapType, DEFAULT_NOTIONAL_KRW};
pub use history::{GapHistoryLog, GapRecord};
pub use pipeline::{ticker_sink, PipelineConfig, TickerPipeline, TICKER_CHANNEL_CAPACITY};
pub use price_store::{PriceStore, StoreStats, UpdateOutcome};

// FX conversion (USD/USDT → KRW)
pub use rates::{spawn_rate_refresh_task, CurrencyPair, RateProvider, RateSnapshot};
