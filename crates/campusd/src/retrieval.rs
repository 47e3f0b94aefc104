//! Retrieval-augmented answering.
//!
//! Three steps: rewrite the question as a standalone query using
//! recent history, fetch the top-k passages, then generate an answer
//! grounded strictly in those passages. The output answer is always
//! non-empty; every failure path has a degraded value.

use crate::config::RetrievalConfig;
use crate::llm::TextGenerator;
use crate::store::DocumentIndex;
use campus_common::{ConversationTurn, RetrievalResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Context placeholder when the search returned nothing.
const NO_DOCUMENTS: &str = "No documents found.";

/// Degraded answer when even grounded generation failed.
const NO_ANSWER: &str =
    "Xin lỗi, hiện tại tôi không thể trả lời câu hỏi này. Vui lòng thử lại sau.";

pub struct RetrievalPipeline {
    generator: Arc<dyn TextGenerator>,
    index: Arc<dyn DocumentIndex>,
    top_k: usize,
    history_window: usize,
}

impl RetrievalPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        index: Arc<dyn DocumentIndex>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            generator,
            index,
            top_k: config.top_k,
            history_window: config.history_window,
        }
    }

    /// Run the full pipeline. Never fails; the answer is non-empty.
    pub async fn answer(&self, question: &str, history: &[ConversationTurn]) -> RetrievalResult {
        let enhanced = self.enhance_query(question, history).await;
        info!("Retrieval query: {}", enhanced);

        let documents = match self.index.search(&enhanced, self.top_k).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Similarity search failed, continuing without documents: {}", e);
                vec![]
            }
        };
        info!("Retrieved {} passages", documents.len());

        let context = if documents.is_empty() {
            NO_DOCUMENTS.to_string()
        } else {
            documents
                .iter()
                .map(|d| d.text.as_str())
                .collect::<Vec<_>>()
                .join("\n---\n")
        };

        let prompt = build_grounded_prompt(&context, question);
        let outcome = self.generator.generate(&prompt).await;

        let answer = if outcome.ok && !outcome.text.trim().is_empty() {
            outcome.text
        } else {
            warn!("Grounded generation failed: {}", outcome.text);
            NO_ANSWER.to_string()
        };

        RetrievalResult { answer, documents }
    }

    /// Rewrite the question as a standalone query. Identity when there
    /// is no history or the question is empty; identity again on any
    /// generation failure.
    async fn enhance_query(&self, question: &str, history: &[ConversationTurn]) -> String {
        if history.is_empty() || question.trim().is_empty() {
            return question.to_string();
        }

        let window_start = history.len().saturating_sub(self.history_window);
        let history_block = history[window_start..]
            .iter()
            .map(|turn| format!("User: {}\nBot: {}", turn.user_text, turn.bot_text))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"Rewrite the following question to be a standalone search query
based on the conversation history. Keep the original language
(Vietnamese or English) of the question.

History:
{history_block}

Question: {question}

Standalone query:"#
        );

        let outcome = self.generator.generate(&prompt).await;
        if outcome.ok && !outcome.text.trim().is_empty() {
            outcome.text.trim().to_string()
        } else {
            question.to_string()
        }
    }
}

fn build_grounded_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are a university assistant. Answer based on the context below.
If the answer is not in the context, say you do not have that
information - never invent an answer.

Context:
{context}

Question: {question}"#
    )
}
