use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::connection_manager::{ConnectionHandle, ConnectionRegistry};
use crate::error::AppError;
use crate::metrics::AdmissionMetrics;
use crate::rooms::{DirectoryError, RoomId};
use crate::server::AppState;

use super::OutboundMessage;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler for `GET /ws/{room_id}`.
///
/// The caller must present a valid token and be a member of the room before
/// the upgrade happens. Refused attempts never touch the registry.
#[tracing::instrument(
    name = "ws.upgrade",
    skip(ws, state, query, headers),
    fields(has_query_token = query.token.is_some())
)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
) -> Response {
    let username = match admit(&state, room_id, &query, &headers).await {
        Ok(username) => username,
        Err(e) => {
            tracing::warn!(room_id, error = %e, "WebSocket admission refused");
            return e.into_response();
        }
    };

    tracing::info!(room_id, username = %username, "WebSocket upgrade accepted");

    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, username))
}

/// Authenticate the caller and confirm room membership.
async fn admit(
    state: &AppState,
    room_id: RoomId,
    query: &WsQuery,
    headers: &HeaderMap,
) -> Result<String, AppError> {
    let Some(token) = extract_token(query, headers) else {
        AdmissionMetrics::record_rejected("missing_token");
        return Err(AppError::Auth("Missing authentication token".to_string()));
    };

    let claims = state.jwt_validator.validate(&token).inspect_err(|_| {
        AdmissionMetrics::record_rejected("invalid_token");
    })?;

    let Some(username) = claims.identity().map(str::to_string) else {
        AdmissionMetrics::record_rejected("invalid_token");
        return Err(AppError::Auth("Token carries no identity".to_string()));
    };

    let lookup = tokio::time::timeout(
        state.settings.websocket.handshake_timeout(),
        state.directory.is_member(room_id, &username),
    )
    .await;

    match lookup {
        Ok(Ok(true)) => Ok(username),
        Ok(Ok(false)) => {
            AdmissionMetrics::record_rejected("not_member");
            Err(AppError::Forbidden(format!(
                "User is not a member of room {}",
                room_id
            )))
        }
        Ok(Err(e)) => {
            AdmissionMetrics::record_rejected("directory_error");
            Err(e.into())
        }
        Err(_) => {
            AdmissionMetrics::record_rejected("timeout");
            Err(DirectoryError::Unavailable("membership lookup timed out".to_string()).into())
        }
    }
}

/// Extract token from query parameter or Authorization header
fn extract_token(query: &WsQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(ref token) = query.token {
        if !token.is_empty() {
            return Some(token.clone());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Keeps a connection registered for as long as it lives.
///
/// Unregistering happens in `Drop`, so it runs exactly once whichever way the
/// connection task ends, including a panic or the task being cancelled.
struct Registration {
    registry: Arc<ConnectionRegistry>,
    handle: Arc<ConnectionHandle>,
    started: Instant,
}

impl Registration {
    fn new(registry: Arc<ConnectionRegistry>, handle: Arc<ConnectionHandle>) -> Self {
        registry.register(handle.clone());
        AdmissionMetrics::record_opened();
        Self {
            registry,
            handle,
            started: Instant::now(),
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.handle.room_id, self.handle.id);

        let duration = self.started.elapsed().as_secs_f64();
        AdmissionMetrics::record_closed(duration);

        tracing::info!(
            connection_id = %self.handle.id,
            room_id = self.handle.room_id,
            username = %self.handle.username,
            duration_secs = duration,
            "WebSocket connection closed"
        );
    }
}

/// Why the read side stopped
#[derive(Debug)]
enum CloseReason {
    /// Peer sent a close frame
    ClientClosed(Option<CloseFrame>),
    /// Stream ended without a close frame
    StreamEnded,
    ReadError(axum::Error),
    /// Write side failed first
    WriteFailed,
}

/// Handle an admitted WebSocket connection until it closes
#[tracing::instrument(name = "ws.connection", skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: AppState, room_id: RoomId, username: String) {
    let ws_config = &state.settings.websocket;
    let (tx, rx) = mpsc::channel::<OutboundMessage>(ws_config.outbound_buffer.max(1));

    let handle = Arc::new(ConnectionHandle::new(room_id, username, tx));
    let connection_id = handle.id;
    let _registration = Registration::new(state.registry.clone(), handle);

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let (ws_sender, ws_receiver) = socket.split();

    // Both halves run inside this task; dropping it tears both down
    let reason = tokio::select! {
        reason = read_loop(ws_receiver) => reason,
        _ = write_loop(ws_sender, rx, ws_config.ping_interval()) => CloseReason::WriteFailed,
    };

    match reason {
        CloseReason::ClientClosed(frame) => {
            tracing::debug!(connection_id = %connection_id, frame = ?frame, "Received close frame");
        }
        CloseReason::StreamEnded => {
            tracing::debug!(connection_id = %connection_id, "WebSocket stream ended");
        }
        CloseReason::ReadError(e) => {
            tracing::warn!(connection_id = %connection_id, error = %e, "Unexpected WebSocket close");
        }
        CloseReason::WriteFailed => {
            tracing::debug!(connection_id = %connection_id, "WebSocket write failed");
        }
    }
}

/// Wait for inbound frames only to notice when the peer goes away.
/// Room state never arrives over this socket, so message contents are ignored.
async fn read_loop(mut receiver: SplitStream<WebSocket>) -> CloseReason {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Close(frame)) => return CloseReason::ClientClosed(frame),
            Ok(_) => {}
            Err(e) => return CloseReason::ReadError(e),
        }
    }
    CloseReason::StreamEnded
}

/// Drain the outbound queue into the socket and send keepalive pings.
/// Returns when a write fails.
async fn write_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<OutboundMessage>,
    ping_interval: Duration,
) {
    let mut ping = tokio::time::interval_at(tokio::time::Instant::now() + ping_interval, ping_interval);

    loop {
        let frame = tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => Message::Text(msg.into_frame()),
                None => return,
            },
            _ = ping.tick() => Message::Ping(Bytes::new()),
        };

        if sender.send(frame).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(room_id: RoomId) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(4);
        (
            Arc::new(ConnectionHandle::new(room_id, "alice".to_string(), tx)),
            rx,
        )
    }

    #[test]
    fn test_extract_token_from_query() {
        let query = WsQuery {
            token: Some("my-token".to_string()),
        };
        let headers = HeaderMap::new();
        assert_eq!(extract_token(&query, &headers), Some("my-token".to_string()));
    }

    #[test]
    fn test_extract_token_from_header() {
        let query = WsQuery { token: None };
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer header-token".parse().unwrap());
        assert_eq!(extract_token(&query, &headers), Some("header-token".to_string()));
    }

    #[test]
    fn test_extract_token_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&WsQuery { token: None }, &headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        let query = WsQuery {
            token: Some(String::new()),
        };
        assert_eq!(extract_token(&query, &headers), None);
    }

    #[test]
    fn test_registration_unregisters_on_drop() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (h, _rx) = handle(42);

        let registration = Registration::new(registry.clone(), h.clone());
        assert_eq!(registry.room_size(42), 1);

        drop(registration);
        assert!(!registry.contains_room(42));
    }

    #[tokio::test]
    async fn test_registration_released_when_task_panics() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (h, _rx) = handle(7);

        let task_registry = registry.clone();
        let task = tokio::spawn(async move {
            let _registration = Registration::new(task_registry, h);
            panic!("connection task failed");
        });

        assert!(task.await.is_err());
        assert!(!registry.contains_room(7));
    }

    #[tokio::test]
    async fn test_registration_released_when_task_aborted() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (h, _rx) = handle(8);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

        let task_registry = registry.clone();
        let task = tokio::spawn(async move {
            let _registration = Registration::new(task_registry, h);
            let _ = ready_tx.send(());
            std::future::pending::<()>().await;
        });

        ready_rx.await.unwrap();
        assert_eq!(registry.room_size(8), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(!registry.contains_room(8));
    }
}
