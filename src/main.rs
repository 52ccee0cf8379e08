//! Spread Scanner: entry point
//!
//! Orchestrates:
//! 1. Config + logging initialization
//! 2. FX rates (USD/USDT → KRW)
//! 3. Symbol universe (config list or Upbit KRW markets)
//! 4. SourceManager → all adapters → one ticker channel
//! 5. Ticker pipeline (price store, batches, gap history)
//! 6. axum HTTP/WebSocket API server
//! 7. Ctrl+C graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use spread_scanner::adapters::types::create_http_client;
use spread_scanner::adapters::upbit::{fetch_krw_markets, UpbitConfig};
use spread_scanner::adapters::{create_adapter, SourceManager};
use spread_scanner::config::{init_logging, resolve_config, AppConfig};
use spread_scanner::core::{
    spawn_rate_refresh_task, ticker_sink, BroadcastEvent, Exchange, GapHistoryLog, PipelineConfig,
    PriceStore, RateProvider, TickerPipeline, TICKER_CHANNEL_CAPACITY,
};
use spread_scanner::server::{self, AppState};

/// How long the pipeline gets to drain after shutdown is signalled
const PIPELINE_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // =========================================================================
    // 1. Config + logging
    // =========================================================================
    dotenvy::dotenv().ok();
    init_logging();

    info!("=== Spread Scanner ===");

    let config = resolve_config()?;
    info!(
        sources = config.sources.len(),
        port = config.server.port,
        "Configuration loaded"
    );

    // =========================================================================
    // 2. FX rates
    // =========================================================================
    let rates = Arc::new(RateProvider::new(&config.rates));
    let snapshot = rates.fetch_rates().await;
    info!(
        usd_krw = snapshot.usd_krw,
        usdt_krw = snapshot.usdt_krw,
        "Exchange rates ready"
    );
    let refresh_handle = (config.rates.refresh_interval_secs > 0).then(|| {
        spawn_rate_refresh_task(
            rates.clone(),
            Duration::from_secs(config.rates.refresh_interval_secs),
        )
    });

    // =========================================================================
    // 3. Symbol universe
    // =========================================================================
    let symbols = resolve_universe(&config).await;
    if symbols.is_empty() {
        anyhow::bail!("symbol universe is empty");
    }
    info!(symbols = symbols.len(), "Symbol universe resolved");

    // =========================================================================
    // 4. Adapters → one ticker channel
    // =========================================================================
    let store = PriceStore::new(&config.store);
    let (ticker_tx, ticker_rx) = mpsc::channel(TICKER_CHANNEL_CAPACITY);
    let mut manager = SourceManager::new();
    manager.on_ticker(ticker_sink(ticker_tx, store.drop_counter()));

    for source in &config.sources {
        match create_adapter(source, rates.clone(), &config.reconnect) {
            Ok(adapter) => {
                manager.register(adapter);
            }
            Err(e) => {
                error!(source = %source.label(), error = %e, "Failed to create adapter");
            }
        }
    }

    let outcomes = manager.connect_all().await;
    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        warn!(failed, total = outcomes.len(), "Some adapters failed to connect");
    }
    manager.subscribe_all(&symbols).await;
    let manager = Arc::new(RwLock::new(manager));

    // =========================================================================
    // 5. Ticker pipeline
    // =========================================================================
    let store = Arc::new(RwLock::new(store));
    let history = Arc::new(RwLock::new(GapHistoryLog::new(config.history.capacity)));
    let (event_tx, _) = broadcast::channel::<BroadcastEvent>(config.broadcast.channel_capacity);

    let pipeline = TickerPipeline::new(
        store.clone(),
        history.clone(),
        event_tx.clone(),
        PipelineConfig::from_config(&config),
    );
    let cancel = CancellationToken::new();
    let pipeline_handle = tokio::spawn(pipeline.run(ticker_rx, cancel.clone()));

    // =========================================================================
    // 6. axum HTTP/WebSocket API server
    // =========================================================================
    let state = AppState {
        event_tx,
        store,
        history,
        manager: manager.clone(),
        rates,
    };
    let port = config.server.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::start_server(state, port).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("Server running on http://0.0.0.0:{}", port);
    info!("WebSocket endpoint: ws://0.0.0.0:{}/ws", port);
    info!("Press Ctrl+C to shutdown");

    // =========================================================================
    // 7. Wait for Ctrl+C → graceful shutdown
    // =========================================================================
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    manager.write().await.disconnect_all().await;
    cancel.cancel();
    if tokio::time::timeout(PIPELINE_SHUTDOWN_GRACE, pipeline_handle)
        .await
        .is_err()
    {
        warn!("Pipeline did not stop in time");
    }
    server_handle.abort();
    if let Some(handle) = refresh_handle {
        handle.abort();
    }

    info!("=== Shutdown complete ===");
    Ok(())
}

/// Config symbols, or every Upbit KRW market when discovery is enabled.
/// Discovery failures fall back to the configured list.
async fn resolve_universe(config: &AppConfig) -> Vec<String> {
    let configured = config.normalized_symbols();
    if !config.discover_upbit_markets {
        return configured;
    }

    let client = create_http_client(Exchange::Upbit);
    match fetch_krw_markets(&client, &UpbitConfig::default().rest_url).await {
        Ok(markets) if !markets.is_empty() => markets,
        Ok(_) => {
            warn!("Upbit returned no KRW markets, using configured symbols");
            configured
        }
        Err(e) => {
            warn!(error = %e, "Upbit market discovery failed, using configured symbols");
            configured
        }
    }
}
