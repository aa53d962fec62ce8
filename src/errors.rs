use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Top-level application error.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Missing configuration: {name} must be set")]
    MissingConfig { name: String },

    // ── Authentication errors ────────────────────────────────────────────────
    #[error("Client not authenticated")]
    Unauthenticated,

    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(#[source] sqlx::Error),

    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    // ── Completion service errors ────────────────────────────────────────────
    #[error("Completion service unavailable: {message}")]
    CompletionUnavailable { message: String },

    #[error("Inference error: {message}")]
    InferenceError { message: String },

    #[error("System prompt unavailable at {url}: {message}")]
    PromptUnavailable { url: String, message: String },

    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    #[error("Field '{field_name}' exceeds max length of {max_length} (actual: {actual_length})")]
    FieldTooLong { field_name: String, max_length: usize, actual_length: usize },

    #[error("Invalid history: {reason}")]
    InvalidHistory { reason: String },

    // ── Conversation errors ──────────────────────────────────────────────────
    #[error("Error fetching chat '{id}'")]
    ChatNotFound { id: String },

    #[error("No messages found for this chat")]
    NoMessages { id: String },

    #[error("A turn is already {state} for chat {chat_id}")]
    TurnInProgress { chat_id: i64, state: String },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn missing_config(name: impl Into<String>) -> Self {
        AppError::MissingConfig { name: name.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ChatNotFound { .. } | AppError::NoMessages { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::EmptyField { .. } | AppError::FieldTooLong { .. } | AppError::InvalidHistory { .. }
        )
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AppError::Unauthenticated)
    }

    pub fn is_completion_unavailable(&self) -> bool {
        matches!(
            self,
            AppError::CompletionUnavailable { .. } | AppError::PromptUnavailable { .. }
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else if self.is_unauthenticated() {
            StatusCode::UNAUTHORIZED
        } else if self.is_not_found() {
            StatusCode::NOT_FOUND
        } else if matches!(self, AppError::TurnInProgress { .. }) {
            StatusCode::CONFLICT
        } else if self.is_completion_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
