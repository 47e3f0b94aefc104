//! Text-generation capability adapter.
//!
//! One narrow interface (prompt in, text out) shared by the intent
//! classifier, the structured-data summarizers, the response evaluator
//! and the grounded answerer. Failures are absorbed here: `generate`
//! never returns `Err`, it returns an outcome with `ok = false` so
//! each caller can apply its own degradation policy.

use crate::config::LlmConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

/// Result of one generation call. `text` is the model output on
/// success, or a short failure note when `ok` is false.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub text: String,
    pub ok: bool,
}

impl GenerateOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: true,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            text: reason.into(),
            ok: false,
        }
    }
}

/// Text generation + embedding capability.
///
/// Constructed once at startup and passed explicitly into each
/// component, so tests can substitute scripted fakes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt. Never fails; inspect `ok`.
    async fn generate(&self, prompt: &str) -> GenerateOutcome;

    /// Embed text for similarity search. Embedding has no sensible
    /// degraded value, so this one is fallible.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Ollama-backed generator.
pub struct OllamaGenerator {
    http_client: reqwest::Client,
    base_url: String,
    chat_model: String,
    embed_model: String,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.generate_timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: config.ollama_url.clone(),
            chat_model: config.chat_model.clone(),
            embed_model: config.embed_model.clone(),
        }
    }

    /// Check if Ollama is reachable
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        self.http_client
            .get(&url)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Raw /api/generate call
    async fn call_generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let body = serde_json::json!({
            "model": self.chat_model,
            "prompt": prompt,
            "stream": false
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            return Err(anyhow!("Ollama returned error {}", response.status()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(anyhow!("Ollama returned an empty response"));
        }

        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> GenerateOutcome {
        info!(
            "LLM call [{}] ({} prompt chars)",
            self.chat_model,
            prompt.len()
        );

        match self.call_generate(prompt).await {
            Ok(text) => GenerateOutcome::success(text),
            Err(e) => {
                error!("Generation failed: {:#}", e);
                GenerateOutcome::failure(format!("generation failed: {}", e))
            }
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let body = serde_json::json!({
            "model": self.embed_model,
            "prompt": text
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send embedding request to Ollama")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Ollama embedding returned error {}",
                response.status()
            ));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse embedding response")?;

        let embedding = json
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| anyhow!("Embedding response missing 'embedding' field"))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Vec<f32>>();

        if embedding.is_empty() {
            return Err(anyhow!("Ollama returned an empty embedding"));
        }

        Ok(embedding)
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted fakes for pipeline tests.

    use super::*;
    use std::sync::Mutex;

    /// Returns canned outcomes in order; repeats the last one when the
    /// script runs out.
    pub struct ScriptedGenerator {
        responses: Mutex<Vec<GenerateOutcome>>,
        pub embedding: Vec<f32>,
    }

    impl ScriptedGenerator {
        pub fn new(responses: Vec<GenerateOutcome>) -> Self {
            let mut responses = responses;
            responses.reverse(); // pop() from the front of the script
            Self {
                responses: Mutex::new(responses),
                embedding: vec![1.0, 0.0, 0.0],
            }
        }

        pub fn always(text: &str) -> Self {
            Self::new(vec![GenerateOutcome::success(text)])
        }

        pub fn failing(reason: &str) -> Self {
            Self::new(vec![GenerateOutcome::failure(reason)])
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> GenerateOutcome {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop().unwrap()
            } else {
                responses
                    .last()
                    .cloned()
                    .unwrap_or_else(|| GenerateOutcome::failure("script exhausted"))
            }
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.embedding.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let ok = GenerateOutcome::success("hello");
        assert!(ok.ok);
        assert_eq!(ok.text, "hello");

        let bad = GenerateOutcome::failure("timed out");
        assert!(!bad.ok);
        assert_eq!(bad.text, "timed out");
    }

    #[tokio::test]
    async fn test_scripted_generator_plays_in_order() {
        let gen = testing::ScriptedGenerator::new(vec![
            GenerateOutcome::success("first"),
            GenerateOutcome::success("second"),
        ]);
        assert_eq!(gen.generate("a").await.text, "first");
        assert_eq!(gen.generate("b").await.text, "second");
        // Script exhausted: last outcome repeats
        assert_eq!(gen.generate("c").await.text, "second");
    }
}
