//! WebSocket session gateway.
//!
//! One socket, one [`Session`]. Inbound frames are handled in order on the
//! reader task, so replies leave in the order their prompts arrived. A writer
//! task drains the session's outbox into the socket.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};

use super::routes::AppState;
use super::types::{ClientEvent, MessageKind};
use crate::session::{EventSink, Session};

/// WebSocket endpoint for prompt relaying
pub async fn relay_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_relay_socket(socket, state))
}

async fn handle_relay_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, mut outbox) = EventSink::channel();
    let mut session = Session::new(Arc::clone(&state.config), Arc::clone(&state.llm), sink)
        .with_captioner(state.captioner.clone());
    let session_id = session.id();
    tracing::info!(session = %session_id, "Client connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to encode {} event: {}", event.name(), e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json)).await.is_err() {
                tracing::debug!(session = %session_id, "Client went away mid-send");
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(t) => match serde_json::from_str::<ClientEvent>(&t) {
                    Ok(event) => session.handle(event).await,
                    Err(e) => {
                        tracing::warn!(session = %session.id(), "Invalid input data: {}", e);
                        session
                            .sink()
                            .message("Validation error: Invalid input data", MessageKind::Error);
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut recv_task => {
            send_task.abort();
        }
        _ = &mut send_task => {
            recv_task.abort();
        }
    }

    tracing::info!(session = %session_id, "Client disconnected");
}
