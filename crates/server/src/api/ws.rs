//! Live run updates over `/api/v1/ws`.
//!
//! Every connected client receives the same JSON stream: progress, status
//! lines, run start/finish and an idle heartbeat. Client frames other than
//! close are ignored.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

use quickinstall_core::OrchestratorEvent;

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Frame pushed to clients, tagged by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Overall run progress (0-100).
    Progress { percent: u8 },
    Status {
        #[serde(skip_serializing_if = "Option::is_none")]
        program: Option<String>,
        message: String,
    },
    RunState { running: bool },
    /// Unix seconds; only sent while nothing else is flowing.
    Heartbeat { timestamp: i64 },
}

impl WsMessage {
    fn type_label(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Status { .. } => "status",
            Self::RunState { .. } => "run_state",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

impl From<OrchestratorEvent> for WsMessage {
    fn from(event: OrchestratorEvent) -> Self {
        match event {
            OrchestratorEvent::Progress { percent } => Self::Progress { percent },
            OrchestratorEvent::Status { program, message } => Self::Status { program, message },
        }
    }
}

/// Fan-out point shared by the event pump and every socket.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// `capacity` bounds how far a slow client may fall behind before it
    /// starts losing frames.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn broadcast(&self, msg: WsMessage) {
        // Err only means there are no subscribers
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    pub fn orchestrator_event(&self, event: OrchestratorEvent) {
        self.broadcast(event.into());
    }

    pub fn run_state(&self, running: bool) {
        self.broadcast(WsMessage::RunState { running });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| serve_client(socket, state))
}

/// Counts a socket in the connection gauges for as long as it lives.
struct Connection;

impl Connection {
    fn open() -> Self {
        WS_CONNECTIONS_TOTAL.inc();
        WS_CONNECTIONS_ACTIVE.inc();
        info!("WebSocket client connected");
        Self
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        WS_CONNECTIONS_ACTIVE.dec();
        info!("WebSocket client disconnected");
    }
}

async fn serve_client(socket: WebSocket, state: Arc<AppState>) {
    let _connection = Connection::open();
    // Subscribe before reading the snapshot so nothing falls in between
    let updates = state.ws_broadcaster().subscribe();
    let catch_up = catch_up(&state).await;
    let (sink, stream) = socket.split();

    tokio::select! {
        _ = push_updates(sink, updates, catch_up) => {}
        _ = wait_for_close(stream) => {}
    }
}

/// Current state for a client that joins mid-run.
async fn catch_up(state: &AppState) -> Vec<WsMessage> {
    let mut messages = vec![WsMessage::RunState {
        running: state.orchestrator().is_running(),
    }];
    if let Some(percent) = state.status().await.progress {
        messages.push(WsMessage::Progress { percent });
    }
    messages
}

async fn push_updates(
    mut sink: SplitSink<WebSocket, Message>,
    mut updates: broadcast::Receiver<WsMessage>,
    catch_up: Vec<WsMessage>,
) {
    for msg in &catch_up {
        if send_json(&mut sink, msg).await.is_err() {
            return;
        }
    }

    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    loop {
        let msg = tokio::select! {
            update = updates.recv() => match update {
                Ok(msg) => {
                    heartbeat.reset();
                    msg
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client fell behind by {} frames", skipped);
                    WS_LAG_EVENTS.inc();
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return,
            },
            _ = heartbeat.tick() => WsMessage::Heartbeat {
                timestamp: Utc::now().timestamp(),
            },
        };

        if let Err(e) = send_json(&mut sink, &msg).await {
            debug!("WebSocket write failed: {}", e);
            return;
        }
    }
}

async fn wait_for_close(mut stream: SplitStream<WebSocket>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => return,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket read failed: {}", e);
                return;
            }
        }
    }
}

/// Writes one frame; a message that fails to serialize is logged and
/// skipped.
async fn send_json<S>(sink: &mut S, msg: &WsMessage) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Cannot encode {} frame: {}", msg.type_label(), e);
            return Ok(());
        }
    };

    sink.send(Message::Text(json.into())).await?;
    WS_MESSAGES_SENT
        .with_label_values(&[msg.type_label()])
        .inc();
    Ok(())
}
