//! HTTP request/response contract between campusd and its clients.

use crate::types::ConversationTurn;
use serde::{Deserialize, Serialize};

/// POST /v1/chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

/// Response to /v1/chat. `history` holds the turns recorded *before*
/// this exchange; the new turn is persisted but not echoed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub history: Vec<ConversationTurn>,
}

/// GET /v1/chat/history/{session_id}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<ConversationTurn>,
}

/// POST /v1/chat/session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionResponse {
    pub session_id: String,
}

/// GET /v1/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
