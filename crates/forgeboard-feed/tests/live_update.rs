//! End-to-end feed client behavior against a local WebSocket server.
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use forgeboard_feed::{
    ActivityUpdate, ConnectionState, FeedConfig, LiveUpdateClient, LogUpdate, StatusUpdate,
    UpdateHandler,
};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Default)]
struct RecordingHandler {
    statuses: Mutex<Vec<StatusUpdate>>,
    activities: Mutex<Vec<ActivityUpdate>>,
    logs: Mutex<Vec<LogUpdate>>,
}

impl RecordingHandler {
    fn statuses(&self) -> Vec<StatusUpdate> {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn activities(&self) -> Vec<ActivityUpdate> {
        self.activities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn logs(&self) -> Vec<LogUpdate> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl UpdateHandler for RecordingHandler {
    fn on_status(&self, update: &StatusUpdate) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(update.clone());
    }

    fn on_activity(&self, activity: &ActivityUpdate) {
        self.activities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(activity.clone());
    }

    fn on_log(&self, log: &LogUpdate) {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(log.clone());
    }
}

fn recording_observer() -> (Arc<Mutex<Vec<ConnectionState>>>, forgeboard_feed::StateObserver) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let observer: forgeboard_feed::StateObserver = Arc::new(move |state| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(state);
    });
    (seen, observer)
}

fn test_config(addr: std::net::SocketAddr, max_attempts: u32) -> FeedConfig {
    let url = Url::parse(&format!("ws://{addr}/ws"))
        .unwrap_or_else(|error| panic!("listener URL should parse: {error}"));
    FeedConfig {
        url,
        connect_timeout: Duration::from_secs(5),
        max_reconnect_attempts: max_attempts,
        // Scaled down so exhausting the ceiling stays fast; the linear
        // schedule itself is covered by the ReconnectPolicy unit tests.
        reconnect_base_delay: Duration::from_millis(10),
    }
}

async fn bind() -> (TcpListener, std::net::SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|error| panic!("listener should bind: {error}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|error| panic!("listener should report its address: {error}"));
    (listener, addr)
}

async fn serve_frames(listener: &TcpListener, frames: Vec<String>) {
    let (tcp, _) = listener
        .accept()
        .await
        .unwrap_or_else(|error| panic!("accept should succeed: {error}"));
    let mut ws = tokio_tungstenite::accept_async(tcp)
        .await
        .unwrap_or_else(|error| panic!("websocket handshake should succeed: {error}"));
    for frame in frames {
        ws.send(Message::Text(frame))
            .await
            .unwrap_or_else(|error| panic!("server send should succeed: {error}"));
    }
    let _ = ws.send(Message::Close(None)).await;
    // Drain until the peer acknowledges the close.
    while let Some(Ok(frame)) = ws.next().await {
        if matches!(frame, Message::Close(_)) {
            break;
        }
    }
}

#[tokio::test]
async fn delivers_frames_and_stops_at_the_retry_ceiling() {
    let (listener, addr) = bind().await;
    let handler = Arc::new(RecordingHandler::default());
    let (seen_states, observer) = recording_observer();
    let client = LiveUpdateClient::with_observer(test_config(addr, 2), observer);

    let server = tokio::spawn(async move {
        serve_frames(
            &listener,
            vec![
                r#"{"running":true,"uptime":"2h 15m","stats":{"messages":150,"commands_executed":25}}"#.to_string(),
                r#"{"activity":{"message":"command executed"}}"#.to_string(),
                r#"{"logs":{"level":"error","message":"boom"}}"#.to_string(),
                "not json at all".to_string(),
            ],
        )
        .await;
        // Listener drops here, so every reconnect attempt is refused
        // and the client runs out of attempts.
    });

    let run_handler: Arc<dyn UpdateHandler> = handler.clone();
    timeout(TEST_TIMEOUT, client.run(run_handler))
        .await
        .unwrap_or_else(|_| panic!("client should give up after the retry ceiling"));
    let _ = timeout(TEST_TIMEOUT, server).await;

    let statuses = handler.statuses();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].running, Some(true));
    assert_eq!(statuses[0].uptime.as_deref(), Some("2h 15m"));

    let activities = handler.activities();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].message, "command executed");

    // The malformed frame is dropped silently; exactly one log line.
    let logs = handler.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, "error");
    assert_eq!(logs[0].message, "boom");

    assert_eq!(client.state().await, ConnectionState::Disconnected);

    let states = seen_states
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    // One live session, then two refused reconnect attempts.
    assert_eq!(states.first(), Some(&ConnectionState::Connecting));
    assert_eq!(
        states.iter().filter(|s| **s == ConnectionState::Connected).count(),
        1
    );
    assert_eq!(states.last(), Some(&ConnectionState::Disconnected));
}

#[tokio::test]
async fn reconnects_after_a_server_close_and_resumes_dispatch() {
    let (listener, addr) = bind().await;
    let handler = Arc::new(RecordingHandler::default());
    let (seen_states, observer) = recording_observer();
    let client = LiveUpdateClient::with_observer(test_config(addr, 3), observer);

    let server = tokio::spawn(async move {
        serve_frames(
            &listener,
            vec![r#"{"activity":{"message":"first session"}}"#.to_string()],
        )
        .await;
        serve_frames(
            &listener,
            vec![r#"{"activity":{"message":"second session"}}"#.to_string()],
        )
        .await;
    });

    let run_handler: Arc<dyn UpdateHandler> = handler.clone();
    timeout(TEST_TIMEOUT, client.run(run_handler))
        .await
        .unwrap_or_else(|_| panic!("client should give up after the retry ceiling"));
    let _ = timeout(TEST_TIMEOUT, server).await;

    let messages: Vec<String> = handler
        .activities()
        .into_iter()
        .map(|activity| activity.message)
        .collect();
    assert_eq!(
        messages,
        vec!["first session".to_string(), "second session".to_string()]
    );

    // A successful reconnect means at least two Connected transitions.
    let states = seen_states
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    assert_eq!(
        states.iter().filter(|s| **s == ConnectionState::Connected).count(),
        2
    );
}

#[tokio::test]
async fn gives_up_when_the_endpoint_never_accepts() {
    // Bind then immediately drop, so the port is (very likely) refused.
    let (listener, addr) = bind().await;
    drop(listener);

    let handler = Arc::new(RecordingHandler::default());
    let client = LiveUpdateClient::new(test_config(addr, 2));

    let run_handler: Arc<dyn UpdateHandler> = handler.clone();
    timeout(TEST_TIMEOUT, client.run(run_handler))
        .await
        .unwrap_or_else(|_| panic!("client should give up after the retry ceiling"));

    assert!(handler.statuses().is_empty());
    assert_eq!(client.state().await, ConnectionState::Disconnected);
}
