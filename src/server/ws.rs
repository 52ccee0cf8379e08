//! WebSocket handler for real-time event streaming.
//!
//! Clients connect to `/ws` and receive JSON events:
//! - `{ "type": "initial_prices", "data": { symbol: { "exchange-market": ticker } } }` once
//! - `{ "type": "price_batch", "data": [ ... ] }` every flush interval
//! - `{ "type": "history_snapshot", "data": { "recorded", "total" } }`

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::AppState;
use crate::core::types::BroadcastEvent;

/// WebSocket upgrade handler at GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn send_event(socket: &mut WebSocket, event: &BroadcastEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize event");
            true
        }
    }
}

/// Handle an individual WebSocket connection.
///
/// Subscribes before taking the snapshot so no batch falls between them.
async fn handle_ws(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();
    info!(clients = state.event_tx.receiver_count(), "WebSocket client connected");

    let table = state.store.read().await.by_symbol_table();
    if !send_event(&mut socket, &BroadcastEvent::InitialPrices(table)).await {
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        if !send_event(&mut socket, &event).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "WS client lagged, skipped events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        debug!("Ignoring inbound client message");
                    }
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}
