//! Generic push-socket adapter
//!
//! `StreamAdapter<P>` owns one socket session for one venue/market. The
//! venue-specific parts (endpoint, subscribe frames, keepalive frame,
//! message parser) live behind `VenueProtocol`; transport, batching,
//! keepalive timing, reconnection and normalization live here.
//!
//! # Session task
//! One task per adapter runs a `select!` over: cancellation, commands
//! from the adapter handle, the keepalive timer, and inbound frames.
//! When the socket drops, the task reconnects under a `RetryPolicy` and
//! resends the current interest set. A transport failure on the very first
//! handshake starts the task directly in that reconnect loop. An exhausted
//! policy ends the task and leaves the adapter disconnected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::adapters::errors::{ExchangeError, ExchangeResult};
use crate::adapters::shared::reconnect::RetryPolicy;
use crate::adapters::shared::websocket::{connect_tls, TlsWebSocketStream};
use crate::adapters::traits::SourceAdapter;
use crate::adapters::types::{AdapterStatus, RawQuote, SourceCore, SymbolFormat, TickerCallback};
use crate::core::rates::RateProvider;
use crate::core::types::{Exchange, MarketType, QuoteCurrency};

/// How long `disconnect` waits for the session task before aborting it
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const COMMAND_CHANNEL_CAPACITY: usize = 8;

type WsSink = SplitSink<TlsWebSocketStream, Message>;

// =============================================================================
// Venue protocol
// =============================================================================

/// Resolved socket endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub url: String,
    /// Interval for the venue keepalive frame; `None` disables it
    pub keepalive: Option<Duration>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, keepalive: Option<Duration>) -> Self {
        Self {
            url: url.into(),
            keepalive,
        }
    }
}

/// Venue-specific half of a socket adapter
#[async_trait]
pub trait VenueProtocol: Send + Sync + 'static {
    fn exchange(&self) -> Exchange;

    fn market_type(&self) -> MarketType;

    fn quote_currency(&self) -> QuoteCurrency;

    fn symbol_format(&self) -> SymbolFormat;

    /// Resolve the URL to dial. Token-gated venues do their handshake here.
    async fn endpoint(&self) -> ExchangeResult<Endpoint>;

    /// Text frames subscribing to `symbols` (canonical), already batched
    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String>;

    /// Application-level keepalive frame
    fn keepalive_frame(&self) -> Option<String> {
        None
    }

    /// Pause between consecutive subscribe frames
    fn frame_spacing(&self) -> Option<Duration> {
        None
    }

    /// Parse one inbound frame. Anything unrecognized yields no quotes.
    fn parse(&self, text: &str) -> Vec<RawQuote>;
}

// =============================================================================
// Adapter
// =============================================================================

enum SessionCommand {
    Resubscribe,
}

enum SessionEnd {
    Cancelled,
    Dropped(String),
}

struct Session {
    cancel: CancellationToken,
    commands: mpsc::Sender<SessionCommand>,
    handle: JoinHandle<()>,
}

/// Socket adapter driven by a `VenueProtocol`
pub struct StreamAdapter<P: VenueProtocol> {
    protocol: Arc<P>,
    core: SourceCore,
    retry: RetryPolicy,
    session: Option<Session>,
}

impl<P: VenueProtocol> StreamAdapter<P> {
    pub fn new(protocol: P, rates: Arc<RateProvider>, retry: RetryPolicy) -> Self {
        let core = SourceCore::new(
            protocol.exchange(),
            protocol.market_type(),
            protocol.quote_currency(),
            rates,
        );
        Self {
            protocol: Arc::new(protocol),
            core,
            retry,
            session: None,
        }
    }

    /// True while the session task is running (connected or reconnecting)
    pub fn is_session_alive(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.handle.is_finished())
    }
}

#[async_trait]
impl<P: VenueProtocol> SourceAdapter for StreamAdapter<P> {
    fn exchange(&self) -> Exchange {
        self.core.exchange()
    }

    fn market_type(&self) -> MarketType {
        self.core.market_type()
    }

    async fn connect(&mut self) -> ExchangeResult<()> {
        if self.is_session_alive() {
            return Ok(());
        }

        let connection = match open_connection(&*self.protocol).await {
            Ok((ws, endpoint)) => {
                self.core.set_connected(true);
                info!(
                    exchange = %self.core.exchange(),
                    market = %self.core.market_type(),
                    url = %endpoint.url,
                    "Socket connected"
                );
                Some((ws, endpoint))
            }
            Err(e) if e.is_transient() => {
                warn!(
                    exchange = %self.core.exchange(),
                    market = %self.core.market_type(),
                    error = %e,
                    "Initial connection failed, retrying in background"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let cancel = CancellationToken::new();
        let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let handle = tokio::spawn(run_session(
            Arc::clone(&self.protocol),
            self.core.clone(),
            connection,
            command_rx,
            cancel.clone(),
            self.retry.clone(),
        ));

        self.session = Some(Session {
            cancel,
            commands,
            handle,
        });
        Ok(())
    }

    async fn subscribe(&mut self, symbols: &[String]) -> ExchangeResult<()> {
        self.core.replace_interest(symbols);

        // A full queue already holds a pending resubscribe, and a reconnect
        // always sends the current interest set.
        if let Some(session) = &self.session {
            if let Err(mpsc::error::TrySendError::Closed(_)) =
                session.commands.try_send(SessionCommand::Resubscribe)
            {
                debug!(
                    exchange = %self.core.exchange(),
                    "Session not running, interest stored for next connect"
                );
            }
        }
        Ok(())
    }

    fn on_ticker(&mut self, callback: TickerCallback) {
        self.core.set_callback(callback);
    }

    async fn disconnect(&mut self) -> ExchangeResult<()> {
        if let Some(mut session) = self.session.take() {
            session.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut session.handle)
                .await
                .is_err()
            {
                session.handle.abort();
            }
            info!(
                exchange = %self.core.exchange(),
                market = %self.core.market_type(),
                "Socket disconnected"
            );
        }
        self.core.set_connected(false);
        Ok(())
    }

    fn status(&self) -> AdapterStatus {
        self.core.status()
    }
}

impl<P: VenueProtocol> Drop for StreamAdapter<P> {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

// =============================================================================
// Session task
// =============================================================================

async fn open_connection<P: VenueProtocol>(
    protocol: &P,
) -> ExchangeResult<(TlsWebSocketStream, Endpoint)> {
    let endpoint = protocol.endpoint().await?;
    let ws = connect_tls(&endpoint.url).await?;
    Ok((ws, endpoint))
}

async fn run_session<P: VenueProtocol>(
    protocol: Arc<P>,
    core: SourceCore,
    mut connection: Option<(TlsWebSocketStream, Endpoint)>,
    mut commands: mpsc::Receiver<SessionCommand>,
    cancel: CancellationToken,
    mut retry: RetryPolicy,
) {
    let exchange = core.exchange();
    let market = core.market_type();

    loop {
        if let Some((ws, endpoint)) = connection.take() {
            match drive_connection(&*protocol, &core, ws, &endpoint, &mut commands, &cancel).await {
                SessionEnd::Cancelled => {
                    core.set_connected(false);
                    debug!(exchange = %exchange, market = %market, "Session stopped");
                    return;
                }
                SessionEnd::Dropped(reason) => {
                    core.set_connected(false);
                    warn!(exchange = %exchange, market = %market, reason = %reason, "Connection lost");
                }
            }
        }

        match reopen(&*protocol, &core, &mut retry, &cancel).await {
            Some(reopened) => {
                retry.reset();
                core.set_connected(true);
                info!(exchange = %exchange, market = %market, "Reconnected");
                connection = Some(reopened);
            }
            None => return,
        }
    }
}

/// Retry the handshake under `retry`. `None` once cancelled or exhausted.
async fn reopen<P: VenueProtocol>(
    protocol: &P,
    core: &SourceCore,
    retry: &mut RetryPolicy,
    cancel: &CancellationToken,
) -> Option<(TlsWebSocketStream, Endpoint)> {
    let exchange = core.exchange();
    let market = core.market_type();

    while let Some(delay) = retry.next_delay() {
        info!(
            exchange = %exchange,
            market = %market,
            attempt = retry.attempts(),
            max_attempts = retry.max_attempts(),
            delay_ms = delay.as_millis() as u64,
            "Reconnecting"
        );
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(delay) => {}
        }
        match open_connection(protocol).await {
            Ok(connection) => return Some(connection),
            Err(e) => {
                warn!(exchange = %exchange, market = %market, error = %e, "Reconnect attempt failed");
            }
        }
    }

    error!(
        exchange = %exchange,
        market = %market,
        max_attempts = retry.max_attempts(),
        "Reconnect attempts exhausted, adapter stays disconnected"
    );
    None
}

async fn drive_connection<P: VenueProtocol>(
    protocol: &P,
    core: &SourceCore,
    ws: TlsWebSocketStream,
    endpoint: &Endpoint,
    commands: &mut mpsc::Receiver<SessionCommand>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut write, mut read) = ws.split();

    if let Err(e) = send_subscriptions(protocol, core, &mut write).await {
        return SessionEnd::Dropped(e.to_string());
    }

    let mut keepalive = endpoint.keepalive.map(keepalive_timer);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return SessionEnd::Cancelled;
            }
            command = commands.recv() => match command {
                Some(SessionCommand::Resubscribe) => {
                    if let Err(e) = send_subscriptions(protocol, core, &mut write).await {
                        return SessionEnd::Dropped(e.to_string());
                    }
                }
                None => return SessionEnd::Cancelled,
            },
            _ = next_tick(&mut keepalive) => {
                if let Some(frame) = protocol.keepalive_frame() {
                    if let Err(e) = write.send(Message::Text(frame)).await {
                        return SessionEnd::Dropped(format!("keepalive send failed: {}", e));
                    }
                    trace!(exchange = %core.exchange(), "Keepalive sent");
                }
            }
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    handle_frame(protocol, core, &text);
                }
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        handle_frame(protocol, core, text);
                    }
                    Err(_) => trace!(exchange = %core.exchange(), "Non-UTF8 binary frame ignored"),
                },
                Some(Ok(Message::Close(frame))) => {
                    return SessionEnd::Dropped(format!("closed by server: {:?}", frame));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                None => return SessionEnd::Dropped("stream ended".to_string()),
            },
        }
    }
}

/// Parse one frame and emit every in-scope quote. Returns the emitted count.
fn handle_frame<P: VenueProtocol>(protocol: &P, core: &SourceCore, text: &str) -> usize {
    let quotes = protocol.parse(text);
    if quotes.is_empty() {
        trace!(exchange = %core.exchange(), len = text.len(), "Frame ignored");
        return 0;
    }
    quotes
        .into_iter()
        .map(|quote| core.emit(quote))
        .filter(|emitted| *emitted)
        .count()
}

async fn send_subscriptions<P: VenueProtocol>(
    protocol: &P,
    core: &SourceCore,
    write: &mut WsSink,
) -> ExchangeResult<()> {
    let symbols = core.interest();
    if symbols.is_empty() {
        return Ok(());
    }

    let frames = protocol.subscribe_frames(&symbols);
    let requests = frames.len();
    for (i, frame) in frames.into_iter().enumerate() {
        if i > 0 {
            if let Some(spacing) = protocol.frame_spacing() {
                tokio::time::sleep(spacing).await;
            }
        }
        write
            .send(Message::Text(frame))
            .await
            .map_err(|e| ExchangeError::SubscriptionFailed {
                exchange: core.exchange(),
                reason: e.to_string(),
            })?;
    }

    info!(
        exchange = %core.exchange(),
        market = %core.market_type(),
        symbols = symbols.len(),
        requests,
        "Subscriptions sent"
    );
    Ok(())
}

fn keepalive_timer(period: Duration) -> Interval {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Split `items` into request-sized groups
pub fn batches<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(|chunk| chunk.to_vec()).collect()
}
