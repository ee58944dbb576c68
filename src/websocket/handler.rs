//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use uuid::Uuid;

use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;
use crate::chart;

/// WebSocket upgrade handler
///
/// This is the entry point for WebSocket connections.
/// It upgrades the HTTP connection to WebSocket and starts message handling.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Render the store as it is right now
async fn current_figure(state: &AppState) -> ServerMessage {
    let store = state.store.read().await;
    ServerMessage::Figure {
        version: store.version(),
        figure: chart::render(&store),
    }
}

/// Counts a connection in `ws_connections` for as long as it lives, including
/// when the connection future is dropped mid-way at shutdown
struct ConnectionGuard {
    state: Arc<AppState>,
}

impl ConnectionGuard {
    fn new(state: Arc<AppState>) -> Self {
        state.ws_connections.fetch_add(1, Ordering::Relaxed);
        Self { state }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.state.ws_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Handle an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = Uuid::new_v4().to_string();

    // Subscribe before the initial render so no update falls in between
    let mut updates = state.updates.subscribe();

    // Channel for everything this connection sends
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let _guard = ConnectionGuard::new(Arc::clone(&state));
    tracing::info!(connection_id = %connection_id, "WebSocket connected");

    let _ = tx.send(ServerMessage::Connected {
        connection_id: connection_id.clone(),
    });
    let _ = tx.send(current_figure(&state).await);

    let conn_id_for_send = connection_id.clone();

    // Task to forward messages from channel to WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_for_send,
                            "WebSocket send failed, closing connection"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize message");
                }
            }
        }
    });

    let state_for_updates = Arc::clone(&state);
    let tx_for_updates = tx.clone();

    // Task to re-render on every store update
    let mut update_task = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                // A lagging receiver only needs the latest state
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    let figure = current_figure(&state_for_updates).await;
                    if tx_for_updates.send(figure).is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let conn_id_for_recv = connection_id.clone();

    // Task to receive messages from WebSocket and handle them
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&tx, &conn_id_for_recv, msg) {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    // Wait for any task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            update_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
            update_task.abort();
        }
        _ = &mut update_task => {
            send_task.abort();
            recv_task.abort();
        }
    }

    tracing::info!(connection_id = %connection_id, "WebSocket disconnected");
}

/// Handle a received WebSocket message
///
/// Returns false if the connection should be closed.
fn handle_ws_message(
    tx: &mpsc::UnboundedSender<ServerMessage>,
    connection_id: &str,
    message: Message,
) -> bool {
    match message {
        Message::Text(text) => {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    let _ = tx.send(ServerMessage::Pong);
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        text = %text,
                        "Invalid client message"
                    );
                    // Send error but keep connection open
                    let _ = tx.send(ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    });
                }
            }
            true
        }
        Message::Binary(_) => {
            let _ = tx.send(ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            });
            true
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;
    use crate::series::{Sample, TimeNormalizer};
    use chrono_tz::Europe::Lisbon;

    #[test]
    fn test_ping_gets_pong() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(handle_ws_message(
            &tx,
            "conn",
            Message::Text(r#"{"type":"ping"}"#.to_string())
        ));
        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::Pong));
    }

    #[test]
    fn test_invalid_text_keeps_connection() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(handle_ws_message(&tx, "conn", Message::Text("hello".to_string())));
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Error { .. }
        ));

        assert!(handle_ws_message(&tx, "conn", Message::Binary(vec![1, 2])));
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Error { .. }
        ));
    }

    #[test]
    fn test_close_ends_connection() {
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(!handle_ws_message(&tx, "conn", Message::Close(None)));
    }

    #[tokio::test]
    async fn test_connection_count_released_when_task_dropped() {
        let state = test_state();
        assert_eq!(state.ws_connection_count(), 0);

        let guard = ConnectionGuard::new(Arc::clone(&state));
        assert_eq!(state.ws_connection_count(), 1);
        drop(guard);
        assert_eq!(state.ws_connection_count(), 0);

        // A connection future aborted before it finishes still gives its slot back
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            let _guard = ConnectionGuard::new(task_state);
            let _ = entered_tx.send(());
            std::future::pending::<()>().await;
        });
        entered_rx.await.unwrap();
        assert_eq!(state.ws_connection_count(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(state.ws_connection_count(), 0);
    }

    #[tokio::test]
    async fn test_current_figure_follows_store() {
        let state = test_state();

        match current_figure(&state).await {
            ServerMessage::Figure { version, figure } => {
                assert_eq!(version, 0);
                assert!(figure.is_empty());
            }
            other => panic!("Expected Figure, got {:?}", other),
        }

        let ts = TimeNormalizer::new(Lisbon)
            .normalize("2024-01-01T10:00:00Z")
            .unwrap();
        state.store.write().await.append(vec![Sample::new(ts, 12.5)]);

        match current_figure(&state).await {
            ServerMessage::Figure { version, figure } => {
                assert_eq!(version, 1);
                assert_eq!(figure.data.len(), 2);
            }
            other => panic!("Expected Figure, got {:?}", other),
        }
    }
}
