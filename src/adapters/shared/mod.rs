//! Shared helpers for source adapters
//!
//! WebSocket connection, reconnection policy, and the two generic
//! adapter drivers (push socket and REST polling).

pub mod polling;
pub mod reconnect;
pub mod stream;
pub mod websocket;

pub use polling::{PollingAdapter, SnapshotVenue};
pub use reconnect::RetryPolicy;
pub use stream::{Endpoint, StreamAdapter, VenueProtocol};
pub use websocket::connect_tls;
