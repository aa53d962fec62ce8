use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::models::{CreateChatRequest, CreateChatResponse};
use crate::routes::AppState;

/// POST `/api/chats` — starts a conversation from an email description
pub async fn create_chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateChatRequest>,
) -> Response {
    let actor = state.identity.actor(&headers);
    match state.chat.create_chat(actor, &request.prompt).await {
        Ok(chat) => (
            StatusCode::CREATED,
            Json(CreateChatResponse { chat_id: chat.id, public_id: chat.public_id }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET `/api/chats/{public_id}` — a conversation with its messages and artifacts
pub async fn get_chat_handler(
    Path(public_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Response {
    match state.chat.get_chat(public_id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}
