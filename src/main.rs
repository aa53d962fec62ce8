mod agent;
mod artifact;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod service;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::{Router, routing::get, routing::post};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::agent::prompt::HttpPromptSource;
use crate::agent::RigCompletionService;
use crate::config::AppConfig;
use crate::db::chat_repository::ChatRepository;
use crate::db::message_repository::MessageRepository;
use crate::db::PgConversationStore;
use crate::errors::AppError;
use crate::routes::api_routes::{create_chat_handler, get_chat_handler};
use crate::routes::ws_routes::ws_chat_handler;
use crate::routes::{AppState, IdentityHeader};
use crate::service::chat_service::ChatService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "v1_email=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env().context("Invalid configuration (copy .env.example to .env)")?;

    // ── Database ──────────────────────────────────────────────────────────────
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(AppError::DatabaseConnectionFailed)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    info!("Database connection established and migrations applied");

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let store = PgConversationStore::new(
        ChatRepository::new(pool.clone()),
        MessageRepository::new(pool.clone()),
    );
    let completion = RigCompletionService::new(
        &config.openai_api_key,
        config.openai_base_url.as_deref(),
        &config.completion_model,
    )?;
    let prompts = HttpPromptSource::new(&config.public_base_url);
    info!(
        "Using model {} with system prompt from {}",
        config.completion_model,
        prompts.url()
    );

    let state = AppState {
        chat: ChatService::new(Arc::new(store), Arc::new(completion), Arc::new(prompts)),
        identity: IdentityHeader::new(config.auth_header.clone()),
    };

    // ── Router ────────────────────────────────────────────────────────────────
    // Static files hold the prompt document and the frontend bundle; unknown
    // paths (e.g. `/emails/{id}`) fall back to the single-page app.
    let static_files = ServeDir::new(&config.static_dir)
        .fallback(ServeFile::new(format!("{}/app/index.html", config.static_dir)));

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if let Some(origin) = &config.cors_origin {
        cors = cors.allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS_ORIGIN {origin}"))?,
        );
    }

    let app = Router::new()
        // API routes
        .route("/api/chats", post(create_chat_handler))
        .route("/api/chats/{public_id}", get(get_chat_handler))
        // Streaming turns
        .route("/ws/chat", get(ws_chat_handler))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
