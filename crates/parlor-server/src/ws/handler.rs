//! WebSocket endpoint: upgrade, per-connection lifecycle, event dispatch.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::connection::ClientConnection;
use super::events::{ClientEvent, ServerEvent};
use crate::http::AppState;
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL};

/// Outbound channel capacity per connection. A client that stays this far
/// behind starts dropping frames and is eventually evicted by the registry.
const OUTBOUND_BUFFER: usize = 256;

/// Error frame text for an unparseable inbound frame.
const INVALID_EVENT_TEXT: &str = "Invalid message format";

/// `GET /ws` upgrade entry point.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let conn_id = format!("conn_{}", Uuid::now_v7());
    ws.on_upgrade(move |socket| handle_socket(socket, conn_id, state))
}

/// Run one connection from upgrade through disconnect.
///
/// 1. Registers the connection with the room registry
/// 2. Forwards outbound frames from the connection's channel to the socket
/// 3. Parses inbound text frames and dispatches them as client events
/// 4. Cleans up registry membership and gauges on disconnect
#[instrument(skip_all, fields(conn_id = %conn_id))]
async fn handle_socket(socket: WebSocket, conn_id: String, state: AppState) {
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Arc<String>>(OUTBOUND_BUFFER);
    let conn = Arc::new(ClientConnection::new(conn_id.clone(), outbound_tx));

    state.rooms.add(Arc::clone(&conn)).await;
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
    info!("client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer task: drains the bounded outbound channel onto the socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_tx
                .send(Message::Text(frame.as_str().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        // Accept Text or UTF-8 Binary frames (iOS clients send binary)
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_string()),
                Err(_) => {
                    info!(len = data.len(), "received non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            // Ping/Pong are answered by the protocol layer.
            Message::Ping(_) | Message::Pong(_) => None,
        };
        let Some(text) = text else { continue };

        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => dispatch(event, &conn, &state).await,
            Err(e) => {
                warn!(error = %e, "rejected unparseable frame");
                let _ = conn.send_event(&ServerEvent::error(INVALID_EVENT_TEXT));
            }
        }
    }

    info!("client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    writer.abort();
    state.rooms.remove(&conn.id).await;
}

/// Route one parsed client event to membership changes or the relay.
async fn dispatch(event: ClientEvent, conn: &Arc<ClientConnection>, state: &AppState) {
    match event {
        ClientEvent::Join(payload) => state.relay.join(conn, payload).await,
        ClientEvent::AdminJoin => {
            conn.join_admin();
            info!(conn_id = %conn.id, "admin joined");
        }
        ClientEvent::AdminSelectSession(session_id) => {
            if conn.watch_session(&session_id) {
                debug!(conn_id = %conn.id, session_id, "admin watching session");
            } else {
                debug!(conn_id = %conn.id, session_id, "ignored select from non-admin");
            }
        }
        ClientEvent::AdminTyping(payload) => state.relay.admin_typing(conn, payload).await,
        ClientEvent::UserTyping(payload) => state.relay.user_typing(payload).await,
        ClientEvent::SendMessage(payload) => state.relay.send_message(conn, payload).await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
