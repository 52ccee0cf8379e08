//! Shared WebSocket connection helpers
//!
//! TLS-enabled WebSocket connection used by every socket adapter.

use std::time::Duration;

use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};

use crate::adapters::errors::ExchangeError;

/// Type alias for the WebSocket stream with TLS
pub type TlsWebSocketStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Handshake deadline
pub const WS_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect to a WebSocket endpoint with TLS (TLSv1.2 minimum).
///
/// Plain `ws://` URLs connect without TLS.
pub async fn connect_tls(url: &str) -> Result<TlsWebSocketStream, ExchangeError> {
    let tls = native_tls::TlsConnector::builder()
        .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
        .build()
        .map_err(|e| ExchangeError::ConnectionFailed(format!("TLS error: {}", e)))?;

    let handshake =
        connect_async_tls_with_config(url, None, false, Some(Connector::NativeTls(tls)));

    let (ws_stream, _response) = tokio::time::timeout(WS_CONNECT_TIMEOUT, handshake)
        .await
        .map_err(|_| ExchangeError::NetworkTimeout(WS_CONNECT_TIMEOUT.as_millis() as u64))?
        .map_err(|e| ExchangeError::WebSocket(Box::new(e)))?;

    Ok(ws_stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused_is_websocket_error() {
        // port 9 (discard) is not listening on loopback in test environments
        let result = connect_tls("ws://127.0.0.1:9/ws").await;
        assert!(matches!(result, Err(ExchangeError::WebSocket(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_fails() {
        assert!(connect_tls("not a url").await.is_err());
    }
}
