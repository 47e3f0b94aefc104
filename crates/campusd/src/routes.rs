//! API routes for campusd.

use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use campus_common::rpc::{ChatRequest, ChatResponse, HealthResponse, HistoryResponse, NewSessionResponse};
use campus_common::VERSION;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

type AppStateArc = Arc<AppState>;

pub fn chat_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/chat", post(chat))
        .route("/v1/chat/history/:session_id", get(chat_history))
        .route("/v1/chat/session", post(new_session))
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

/// One user turn through the full orchestration pipeline. The
/// orchestrator always yields text, so this handler cannot fail.
async fn chat(
    State(state): State<AppStateArc>,
    Json(req): Json<ChatRequest>,
) -> Json<ChatResponse> {
    info!("Chat request for session {}", req.session_id);

    let outcome = state
        .orchestrator
        .answer(&req.session_id, &req.message)
        .await;

    Json(ChatResponse {
        answer: outcome.answer,
        history: outcome.history,
    })
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    100
}

async fn chat_history(
    State(state): State<AppStateArc>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryResponse> {
    let history = state
        .turns
        .recent_turns(&session_id, params.limit)
        .unwrap_or_default();

    Json(HistoryResponse {
        session_id,
        history,
    })
}

async fn new_session(State(_state): State<AppStateArc>) -> Json<NewSessionResponse> {
    let session_id = Uuid::new_v4().to_string();
    info!("Created chat session {}", session_id);
    Json(NewSessionResponse { session_id })
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
