//! Live-update client: keeps the feed channel alive with bounded
//! automatic recovery and routes parsed frames to handlers.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;

use crate::dispatch::{UpdateHandler, dispatch};
use crate::error::{FeedError, Result};
use crate::message::parse_update;
use crate::reconnect::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, ReconnectPolicy};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state; transitions drive the dashboard indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Callback invoked on every connection state transition.
pub type StateObserver = Arc<dyn Fn(ConnectionState) + Send + Sync>;

/// Feed client configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: Url,
    pub connect_timeout: Duration,
    pub max_reconnect_attempts: u32,
    pub reconnect_base_delay: Duration,
}

impl FeedConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            connect_timeout: Duration::from_secs(10),
            max_reconnect_attempts: DEFAULT_MAX_ATTEMPTS,
            reconnect_base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

/// Derive the feed endpoint from the dashboard's API base URL: the
/// `/ws` path on the same host, secure scheme when the base is secure.
pub fn feed_url(base: &Url) -> Result<Url> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(FeedError::InvalidUrl(format!(
                "unsupported base scheme: {other}"
            )));
        }
    };
    let mut url = base.clone();
    url.set_scheme(scheme)
        .map_err(|()| FeedError::InvalidUrl(format!("cannot map {} to {scheme}", base.scheme())))?;
    url.set_path("/ws");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Live-update client. Owns at most one active channel at a time; each
/// reconnect attempt replaces the previous handle.
pub struct LiveUpdateClient {
    config: FeedConfig,
    state: Arc<RwLock<ConnectionState>>,
    observer: Option<StateObserver>,
}

impl LiveUpdateClient {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            observer: None,
        }
    }

    pub fn with_observer(config: FeedConfig, observer: StateObserver) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            observer: Some(observer),
        }
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Shared handle onto the connection state, for renderers.
    pub fn state_handle(&self) -> Arc<RwLock<ConnectionState>> {
        Arc::clone(&self.state)
    }

    /// Keep the feed alive until the retry ceiling is reached.
    ///
    /// Each failed session consumes one attempt, whether the connect
    /// itself failed, the transport errored mid-stream, or the server
    /// closed the channel. A successful connect resets the counter.
    /// Once the ceiling is reached the client stays `Disconnected` for
    /// good; resuming requires a fresh `run` call.
    pub async fn run(&self, handler: Arc<dyn UpdateHandler>) {
        let mut policy = ReconnectPolicy::new(
            self.config.max_reconnect_attempts,
            self.config.reconnect_base_delay,
        );

        loop {
            self.set_state(ConnectionState::Connecting).await;
            match self.connect().await {
                Ok(stream) => {
                    policy.reset();
                    self.set_state(ConnectionState::Connected).await;
                    self.read_session(stream, handler.as_ref()).await;
                }
                Err(error) => {
                    warn!("feed connect failed: {error}");
                }
            }
            self.set_state(ConnectionState::Disconnected).await;

            match policy.next_delay() {
                Some(delay) => {
                    debug!(
                        attempt = policy.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "scheduling feed reconnect"
                    );
                    sleep(delay).await;
                }
                None => {
                    warn!(
                        attempts = policy.attempts(),
                        "feed reconnect ceiling reached, giving up"
                    );
                    break;
                }
            }
        }
    }

    async fn connect(&self) -> Result<WsStream> {
        let (stream, _response) = timeout(
            self.config.connect_timeout,
            connect_async(self.config.url.as_str()),
        )
        .await
        .map_err(|_| {
            FeedError::Timeout(format!(
                "connection timeout after {:?}",
                self.config.connect_timeout
            ))
        })?
        .map_err(|error| FeedError::WebSocket(error.to_string()))?;
        Ok(stream)
    }

    /// Read frames until the channel closes or errors. Malformed frames
    /// are dropped with a diagnostic and never reach a handler.
    async fn read_session(&self, mut stream: WsStream, handler: &dyn UpdateHandler) {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match parse_update(text.as_str()) {
                    Ok(update) => dispatch(&update, handler),
                    Err(error) => warn!("dropping malformed feed frame: {error}"),
                },
                Ok(Message::Ping(payload)) => {
                    if let Err(error) = stream.send(Message::Pong(payload)).await {
                        warn!("websocket pong failed: {error}");
                        break;
                    }
                }
                Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => {}
                Ok(Message::Frame(_)) => {}
                Err(error) => {
                    warn!("websocket read error: {error}");
                    break;
                }
            }
        }
    }

    async fn set_state(&self, next: ConnectionState) {
        *self.state.write().await = next;
        if let Some(observer) = &self.observer {
            observer(next);
        }
    }
}
