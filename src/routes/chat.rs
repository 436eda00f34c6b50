use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::chat::ChatManager;
use crate::protocol::ServerEvent;
use crate::state::AppState;

/// Build the chat route group: `/ws`
pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// `GET /ws` — Upgrade to `WebSocket` and enter the matchmaking flow.
///
/// The caller is expected to sit behind whatever authenticates the user; the display name
/// arrives in the client's `join` event.
async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state.chat, socket))
}

/// Drive one chat connection until either direction of the socket closes.
async fn handle_ws_connection(chat: ChatManager, socket: WebSocket) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let id = chat.register(tx);

    // Forward outbound events to the WebSocket
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!("Failed to encode outbound event: {err}");
                    continue;
                }
            };
            if ws_sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Events from one connection are applied strictly in arrival order
    let inbound = async {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(err) = chat.handle_text(id, text.as_str()) {
                        tracing::warn!(connection_id = %id, error = %err, "Ignoring inbound event");
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(connection_id = %id, "WebSocket read failed: {err}");
                    break;
                }
            }
        }
    };

    tokio::select! {
        () = inbound => {}
        _ = &mut send_task => {}
    }

    // Cleanup on disconnect
    send_task.abort();
    chat.release(id);
}
