//! HTTP/WebSocket API for prices, gaps and gap history.
//!
//! Uses `axum` for HTTP/WS routing with CORS support.

pub mod ws;

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::adapters::{ManagerStatus, SourceManager};
use crate::core::gaps::{Gap, GapFilter, DEFAULT_NOTIONAL_KRW};
use crate::core::history::{GapHistoryLog, GapRecord};
use crate::core::price_store::{PriceStore, StoreStats};
use crate::core::rates::RateProvider;
use crate::core::types::{current_time_ms, BroadcastEvent, Exchange, PriceTable};
use crate::error::AppError;

/// Default page size for gap and history queries
const DEFAULT_LIMIT: usize = 100;

/// Shared application state for the HTTP/WS server.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast channel for pipeline events → WS clients
    pub event_tx: broadcast::Sender<BroadcastEvent>,
    pub store: Arc<RwLock<PriceStore>>,
    pub history: Arc<RwLock<GapHistoryLog>>,
    pub manager: Arc<RwLock<SourceManager>>,
    pub rates: Arc<RateProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/prices", get(prices_handler))
        .route("/api/exchanges/status", get(exchanges_status_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/gaps", get(gaps_handler))
        .route("/api/history/recent", get(history_recent_handler))
        .route("/api/history/stats", get(history_stats_handler))
        .route("/api/history/:symbol", get(history_symbol_handler))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP/WebSocket server.
///
/// Blocks until the server shuts down.
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!(address = %addr, "Starting HTTP/WebSocket API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

/// GET /health: server status
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": current_time_ms(),
    }))
}

/// GET /api/prices: symbol → "exchange-market" → ticker
async fn prices_handler(State(state): State<AppState>) -> Json<PriceTable> {
    let store = state.store.read().await;
    Json(store.by_symbol_table())
}

/// GET /api/exchanges/status: per-adapter health
async fn exchanges_status_handler(State(state): State<AppState>) -> Json<ManagerStatus> {
    let manager = state.manager.read().await;
    Json(manager.status())
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    store: StoreStats,
    usd_krw: f64,
    usdt_krw: f64,
}

/// GET /api/stats: store counters and current rates
async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store = state.store.read().await.stats();
    let rates = state.rates.snapshot();
    Json(StatsResponse {
        store,
        usd_krw: rates.usd_krw,
        usdt_krw: rates.usdt_krw,
    })
}

#[derive(Debug, Default, Deserialize)]
struct GapsQuery {
    min_spread: Option<f64>,
    /// Comma-separated exchange names
    exchanges: Option<String>,
    limit: Option<usize>,
}

impl GapsQuery {
    fn filter(&self) -> Result<GapFilter, String> {
        let exchanges = match self.exchanges.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(list) => Some(
                list.split(',')
                    .filter(|name| !name.trim().is_empty())
                    .map(|name| name.parse::<Exchange>())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(GapFilter {
            min_spread: self.min_spread,
            exchanges,
        })
    }
}

#[derive(Debug, Serialize)]
struct GapView {
    #[serde(flatten)]
    gap: Gap,
    /// On a 1,000,000 KRW notional
    estimated_profit: f64,
}

/// GET /api/gaps?min_spread&exchanges&limit: current gaps, widest first
async fn gaps_handler(
    State(state): State<AppState>,
    Query(query): Query<GapsQuery>,
) -> Result<Json<Vec<GapView>>, ApiError> {
    let filter = query.filter().map_err(bad_request)?;
    let snapshot = state.store.read().await.snapshot_all();

    let gaps = filter
        .detect(&snapshot)
        .into_iter()
        .take(query.limit.unwrap_or(DEFAULT_LIMIT))
        .map(|gap| GapView {
            estimated_profit: gap.estimated_profit(DEFAULT_NOTIONAL_KRW),
            gap,
        })
        .collect();
    Ok(Json(gaps))
}

#[derive(Debug, Default, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

/// GET /api/history/recent?limit
async fn history_recent_handler(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<GapRecord>> {
    let history = state.history.read().await;
    Json(history.recent(query.limit.unwrap_or(DEFAULT_LIMIT)))
}

/// GET /api/history/stats
async fn history_stats_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let history = state.history.read().await;
    Json(serde_json::json!({
        "total": history.count(),
        "max_size": history.capacity(),
    }))
}

/// GET /api/history/:symbol?limit: symbol is case-insensitive
async fn history_symbol_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<GapRecord>> {
    let history = state.history.read().await;
    Json(history.by_symbol(
        &symbol.to_uppercase(),
        query.limit.unwrap_or(DEFAULT_LIMIT),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MarketType, NormalizedTicker};

    fn state() -> AppState {
        let (event_tx, _) = broadcast::channel(16);
        AppState {
            event_tx,
            store: Arc::new(RwLock::new(PriceStore::default())),
            history: Arc::new(RwLock::new(GapHistoryLog::new(50))),
            manager: Arc::new(RwLock::new(SourceManager::new())),
            rates: Arc::new(RateProvider::fixed(1_400.0, 0.998)),
        }
    }

    async fn serve(state: AppState) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn seed(state: &AppState) {
        let mut store = state.store.write().await;
        store.update(NormalizedTicker::new(Exchange::Upbit, MarketType::Spot, "BTC", 50_000.0));
        store.update(NormalizedTicker::new(Exchange::Okx, MarketType::Spot, "BTC", 50_500.0));
        store.update(NormalizedTicker::new(Exchange::Upbit, MarketType::Spot, "ETH", 1_000.0));
        store.update(NormalizedTicker::new(Exchange::Mexc, MarketType::Spot, "ETH", 1_030.0));
    }

    #[tokio::test]
    async fn test_health_and_prices() {
        let state = state();
        seed(&state).await;
        let base = serve(state).await;

        let health: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let prices: serde_json::Value = reqwest::get(format!("{}/api/prices", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(prices["BTC"]["upbit-spot"]["last"], 50_000.0);
        assert_eq!(prices["ETH"]["mexc-spot"]["exchange"], "mexc");
    }

    #[tokio::test]
    async fn test_gaps_query() {
        let state = state();
        seed(&state).await;
        let base = serve(state).await;

        let gaps: serde_json::Value = reqwest::get(format!("{}/api/gaps", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let gaps = gaps.as_array().unwrap();
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0]["symbol"], "ETH");
        assert_eq!(gaps[0]["gap_type"], "spot-spot");
        assert!((gaps[1]["estimated_profit"].as_f64().unwrap() - 10_000.0).abs() < 1e-6);

        let narrowed: serde_json::Value =
            reqwest::get(format!("{}/api/gaps?exchanges=upbit,okx&min_spread=0.5", base))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        let narrowed = narrowed.as_array().unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0]["symbol"], "BTC");

        let response = reqwest::get(format!("{}/api/gaps?exchanges=kraken", base))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_routes() {
        let state = state();
        {
            let mut history = state.history.write().await;
            for (i, symbol) in ["BTC", "ETH", "BTC"].iter().enumerate() {
                history.append(GapRecord {
                    symbol: symbol.to_string(),
                    spread: 1.0,
                    low_exchange: Exchange::Binance,
                    high_exchange: Exchange::Upbit,
                    timestamp: i as u64,
                });
            }
        }
        let base = serve(state).await;

        let recent: Vec<GapRecord> = reqwest::get(format!("{}/api/history/recent?limit=2", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].timestamp, 2);

        let btc: Vec<GapRecord> = reqwest::get(format!("{}/api/history/btc", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(btc.len(), 2);

        let stats: serde_json::Value = reqwest::get(format!("{}/api/history/stats", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["total"], 3);
        assert_eq!(stats["max_size"], 50);
    }

    #[tokio::test]
    async fn test_status_and_stats() {
        let state = state();
        seed(&state).await;
        let base = serve(state).await;

        let status: serde_json::Value = reqwest::get(format!("{}/api/exchanges/status", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["total_adapters"], 0);

        let stats: serde_json::Value = reqwest::get(format!("{}/api/stats", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(stats["total_prices"], 4);
        assert_eq!(stats["dropped_ticks"], 0);
        assert_eq!(stats["usd_krw"], 1_400.0);
    }

    #[tokio::test]
    async fn test_start_server_reports_busy_port() {
        let taken = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = start_server(state(), port).await.unwrap_err();
        let bind = err.downcast_ref::<AppError>().expect("bind error");
        assert!(matches!(bind, AppError::Bind { .. }));
        assert!(err.to_string().contains(&port.to_string()), "Got: {}", err);
    }
}
