//! Retrieval-answer evaluation.
//!
//! One generation call judges whether the retrieval answer actually
//! addresses the question and whether the question needs structured
//! student data. This verdict is the sole gate between the two answer
//! strategies, so parsing is deliberately forgiving and every failure
//! lands on the conservative fallback.

use crate::llm::TextGenerator;
use campus_common::EvaluationResult;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ResponseEvaluator {
    generator: Arc<dyn TextGenerator>,
}

/// Wire shape requested from the model. Missing fields default to the
/// conservative side.
#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    is_sufficient: bool,
    #[serde(default)]
    needs_student_data: bool,
    #[serde(default)]
    reason: String,
}

impl ResponseEvaluator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Evaluate a retrieval answer. Never fails.
    pub async fn evaluate(&self, question: &str, answer: &str) -> EvaluationResult {
        let prompt = build_evaluation_prompt(question, answer);
        let outcome = self.generator.generate(&prompt).await;

        if !outcome.ok {
            warn!("Evaluation call failed: {}", outcome.text);
            return EvaluationResult::fallback(format!("evaluation failed: {}", outcome.text));
        }

        let result = parse_evaluation(&outcome.text);
        info!(
            "Evaluation: is_sufficient={}, needs_student_data={}, reason={}",
            result.is_sufficient, result.needs_student_data, result.reason
        );
        result
    }
}

/// Extract the first well-formed JSON block from the response text.
fn parse_evaluation(text: &str) -> EvaluationResult {
    let json_text = extract_json(text);

    match serde_json::from_str::<RawEvaluation>(&json_text) {
        Ok(raw) => EvaluationResult {
            is_sufficient: raw.is_sufficient,
            needs_student_data: raw.needs_student_data,
            reason: raw.reason,
        },
        Err(e) => {
            warn!("Failed to parse evaluation JSON: {} - text: {}", e, text);
            EvaluationResult::fallback("failed to parse evaluation response")
        }
    }
}

/// Slice out the outermost `{...}` block when the model wrapped its
/// JSON in prose.
fn extract_json(text: &str) -> String {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return text[start..=end].to_string();
        }
    }
    text.to_string()
}

fn build_evaluation_prompt(question: &str, answer: &str) -> String {
    format!(
        r#"You are an orchestration agent that evaluates chatbot responses.
Analyze if the retrieval-based response adequately answers the user's
question.

User question: {question}

Response: {answer}

Evaluate against these criteria:
1. Does the response directly answer the question?
2. Is it informative rather than an apology or "I don't know"?
3. Does the question require student-specific data that document
   retrieval cannot provide? Student-data questions mention a student
   id (one letter followed by nine digits), or credits, schedules or
   grades of an individual student.

Return your evaluation as exactly this JSON, nothing else:
{{"is_sufficient": true/false, "reason": "brief explanation", "needs_student_data": true/false}}"#
    )
}
