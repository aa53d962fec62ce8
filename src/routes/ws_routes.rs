use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use tracing::{info, warn};

use crate::artifact::{Artifact, ArtifactParser};
use crate::models::{Actor, WsChatRequest, WsEvent};
use crate::routes::AppState;
use crate::service::chat_service::{ChatService, TurnEvent};

/// GET `/ws/chat` — upgrades to a WebSocket for streaming turns.
pub async fn ws_chat_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Identity is fixed at upgrade time; every turn on the socket runs as this actor.
    let actor = state.identity.actor(&headers);
    ws.on_upgrade(move |socket| handle_socket(socket, state.chat, actor))
}

/// Handles a single WebSocket connection.
///
/// Protocol:
/// - Client sends JSON `{ "chat_id": 1, "history": [{ "role": "user", "content": "..." }] }`
/// - Server streams back:
///   1. `{ "type": "stream_start", "chat_id": 1 }`
///   2. `{ "type": "stream_chunk", "content": "..." }` (repeated), interleaved with
///      `{ "type": "artifact", "index": 0, "artifact": {...} }` as blocks close
///   3. `{ "type": "stream_end", "message_id": "...", "full_content": "..." }`
///   or `{ "type": "error", "message": "..." }` on failure.
async fn handle_socket(mut socket: WebSocket, svc: ChatService, actor: Option<Actor>) {
    info!("WebSocket client connected");

    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket receive error: {e}");
                break;
            }
        };

        // Only handle text messages
        let text = match &msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        let request: WsChatRequest = match serde_json::from_str(&text) {
            Ok(r) => r,
            Err(e) => {
                send_event(&mut socket, &WsEvent::Error {
                    message: format!("Invalid request: {e}"),
                }).await;
                continue;
            }
        };

        let mut turn = match svc
            .continue_conversation(actor, request.chat_id, request.history)
            .await
        {
            Ok(turn) => turn,
            Err(e) => {
                send_event(&mut socket, &WsEvent::Error { message: e.to_string() }).await;
                continue;
            }
        };

        send_event(&mut socket, &WsEvent::StreamStart { chat_id: turn.chat_id }).await;

        let mut parser = ArtifactParser::new();
        while let Some(event) = turn.events.recv().await {
            for ws_event in to_ws_events(&mut parser, event) {
                send_event(&mut socket, &ws_event).await;
            }
        }
    }

    info!("WebSocket client disconnected");
}

/// Maps one turn event onto the wire, announcing artifacts the moment they close.
fn to_ws_events(parser: &mut ArtifactParser, event: TurnEvent) -> Vec<WsEvent> {
    match event {
        TurnEvent::Delta(content) => {
            let completed: Vec<Artifact> = parser.push(&content).to_vec();
            let first_index = parser.artifacts().len() - completed.len();

            let mut events = vec![WsEvent::StreamChunk { content }];
            events.extend(
                completed
                    .into_iter()
                    .enumerate()
                    .map(|(offset, artifact)| WsEvent::Artifact { index: first_index + offset, artifact }),
            );
            events
        }
        TurnEvent::Completed { message_id, content } => {
            vec![WsEvent::StreamEnd { message_id, full_content: content }]
        }
        TurnEvent::Failed { reason } => vec![WsEvent::Error { message: reason }],
    }
}

/// Helper: serialize a `WsEvent` and send it over the socket.
async fn send_event(socket: &mut WebSocket, event: &WsEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        let _ = socket.send(Message::Text(json.into())).await;
    }
}
