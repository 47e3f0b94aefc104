//! HTTP client for communicating with campusd.

use anyhow::{anyhow, Context, Result};
use campus_common::rpc::{
    ChatRequest, ChatResponse, HealthResponse, HistoryResponse, NewSessionResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7870";

pub struct CampusdClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl CampusdClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse> {
        let response = self
            .http_client
            .post(format!("{}/v1/chat", self.base_url))
            .json(&ChatRequest {
                session_id: session_id.to_string(),
                message: message.to_string(),
            })
            .send()
            .await
            .context("Cannot reach campusd - is the daemon running?")?;

        if !response.status().is_success() {
            return Err(anyhow!("campusd returned {}", response.status()));
        }

        Ok(response.json().await?)
    }

    pub async fn history(&self, session_id: &str, limit: usize) -> Result<HistoryResponse> {
        let response = self
            .http_client
            .get(format!(
                "{}/v1/chat/history/{}?limit={}",
                self.base_url, session_id, limit
            ))
            .send()
            .await
            .context("Cannot reach campusd - is the daemon running?")?;

        Ok(response.json().await?)
    }

    pub async fn new_session(&self) -> Result<NewSessionResponse> {
        let response = self
            .http_client
            .post(format!("{}/v1/chat/session", self.base_url))
            .send()
            .await
            .context("Cannot reach campusd - is the daemon running?")?;

        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http_client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .context("Cannot reach campusd - is the daemon running?")?;

        Ok(response.json().await?)
    }
}
