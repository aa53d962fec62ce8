use gloo_net::http::Request;

use crate::models::{ChatView, CreateChatRequest, CreateChatResponse};

/// Backend origin used when the page has no http(s) origin.
const FALLBACK_ORIGIN: &str = "http://localhost:8080";

/// Base URL of the backend API server: the origin that served this page.
fn api_base() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .filter(|origin| origin.starts_with("http"))
        .unwrap_or_else(|| FALLBACK_ORIGIN.to_string())
}

/// Creates a chat whose first user message is `prompt`.
pub async fn create_chat(prompt: &str) -> Result<CreateChatResponse, String> {
    let body = CreateChatRequest {
        prompt: prompt.to_string(),
    };

    let resp = Request::post(&format!("{}/api/chats", api_base()))
        .json(&body)
        .map_err(|e| format!("Serialize error: {e}"))?
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    if !resp.ok() {
        return Err(format!("Server error: {}", resp.status()));
    }

    resp.json::<CreateChatResponse>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}

/// Fetches a chat and its live messages by public id.
pub async fn fetch_chat(public_id: &str) -> Result<ChatView, String> {
    let resp = Request::get(&format!("{}/api/chats/{public_id}", api_base()))
        .send()
        .await
        .map_err(|e| format!("Network error: {e}"))?;

    match resp.status() {
        200 => {}
        404 => return Err("Error fetching chat".to_string()),
        status => return Err(format!("Server error: {status}")),
    }

    resp.json::<ChatView>()
        .await
        .map_err(|e| format!("Parse error: {e}"))
}

/// Returns the WebSocket URL for the chat streaming endpoint.
pub fn ws_url() -> String {
    ws_url_for(&api_base())
}

/// `http` becomes `ws` and `https` becomes `wss`.
fn ws_url_for(origin: &str) -> String {
    format!("{}/ws/chat", origin.replacen("http", "ws", 1))
}
