//! Source adapter error types
//!
//! Transport, handshake and snapshot failures raised by adapters are
//! wrapped in `ExchangeError`. Malformed venue messages never surface
//! here: parsers drop them.

use thiserror::Error;

use crate::core::types::Exchange;

/// Error types for source adapter operations
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Connection to the venue failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Subscription request could not be delivered
    #[error("Subscription failed on {exchange}: {reason}")]
    SubscriptionFailed { exchange: Exchange, reason: String },

    /// Venue refused a handshake request (token, credentials, bad request)
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Network operation timed out
    #[error("Network timeout after {0}ms")]
    NetworkTimeout(u64),

    /// Invalid or unexpected response from the venue
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// REST request failed (token handshake, snapshot poll, market list)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Requested exchange/market combination has no adapter
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// WebSocket protocol error (boxed to reduce enum size)
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
}

impl ExchangeError {
    /// Failures worth retrying under the reconnect policy.
    ///
    /// `Rejected`, `InvalidResponse` and `UnsupportedSource` are setup
    /// errors: retrying cannot fix them.
    pub fn is_transient(&self) -> bool {
        match self {
            ExchangeError::ConnectionFailed(_)
            | ExchangeError::NetworkTimeout(_)
            | ExchangeError::SubscriptionFailed { .. } => true,
            // a malformed URL never heals
            ExchangeError::WebSocket(e) => {
                !matches!(**e, tokio_tungstenite::tungstenite::Error::Url(_))
            }
            ExchangeError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ExchangeError::Rejected(_)
            | ExchangeError::InvalidResponse(_)
            | ExchangeError::UnsupportedSource(_) => false,
        }
    }
}

/// Result type alias for adapter operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_display() {
        let err = ExchangeError::ConnectionFailed("bullet-public refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: bullet-public refused");
    }

    #[test]
    fn test_subscription_failed_display() {
        let err = ExchangeError::SubscriptionFailed {
            exchange: Exchange::Bybit,
            reason: "session closed".to_string(),
        };
        assert_eq!(err.to_string(), "Subscription failed on bybit: session closed");
    }

    #[test]
    fn test_transport_errors_are_transient() {
        assert!(ExchangeError::ConnectionFailed("refused".into()).is_transient());
        assert!(ExchangeError::NetworkTimeout(10_000).is_transient());
        let ws = tokio_tungstenite::tungstenite::Error::ConnectionClosed;
        assert!(ExchangeError::WebSocket(Box::new(ws)).is_transient());
    }

    #[test]
    fn test_setup_errors_are_not_transient() {
        assert!(!ExchangeError::Rejected("token request code 400100".into()).is_transient());
        assert!(!ExchangeError::InvalidResponse("no instance servers".into()).is_transient());
        assert!(!ExchangeError::UnsupportedSource("upbit/futures".into()).is_transient());
        let url = tokio_tungstenite::tungstenite::Error::Url(
            tokio_tungstenite::tungstenite::error::UrlError::NoHostName,
        );
        assert!(!ExchangeError::WebSocket(Box::new(url)).is_transient());
    }

    #[test]
    fn test_network_timeout_display() {
        let err = ExchangeError::NetworkTimeout(10_000);
        assert_eq!(err.to_string(), "Network timeout after 10000ms");
    }

    #[test]
    fn test_unsupported_source_display() {
        let err = ExchangeError::UnsupportedSource("upbit/futures".to_string());
        assert_eq!(err.to_string(), "Unsupported source: upbit/futures");
    }
}
