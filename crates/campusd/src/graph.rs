//! Intent routing graph.
//!
//! A fixed node sequence: receive → normalize → extract id → classify
//! → one intent handler → done. Every node folds its own failure into
//! the trace; the graph always reaches the terminal state and always
//! produces a non-empty reply. One synchronous pass per request, no
//! retries.

use crate::extract::extract_student_id;
use crate::handlers::StudentHandlers;
use crate::intent::IntentClassifier;
use crate::normalize::normalize;
use campus_common::Intent;
use tracing::info;

/// Mutable state threaded through one graph invocation. Created fresh
/// per request, owned exclusively by the graph, never persisted.
#[derive(Debug)]
pub struct PipelineState {
    pub raw_query: String,
    pub cleaned_query: String,
    pub intent: Intent,
    pub student_id: Option<String>,
    /// Ordered human-readable log of what each stage did; joined into
    /// the externally visible reply.
    pub trace: Vec<String>,
    /// Set when a capability failure (not an expected absence) made
    /// the reply unreliable. The orchestrator falls back to the
    /// retrieval answer when this is set.
    failed: bool,
}

impl PipelineState {
    pub fn new(raw_query: impl Into<String>) -> Self {
        Self {
            raw_query: raw_query.into(),
            cleaned_query: String::new(),
            intent: Intent::Unknown,
            student_id: None,
            trace: Vec::new(),
            failed: false,
        }
    }

    /// Append one trace line.
    pub fn note(&mut self, line: impl Into<String>) {
        self.trace.push(line.into());
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// The accumulated trace as the user-visible reply.
    pub fn reply(&self) -> String {
        self.trace.join("\n")
    }
}

/// The fixed routing graph over the structured-data path.
pub struct RoutingGraph {
    classifier: IntentClassifier,
    handlers: StudentHandlers,
}

impl RoutingGraph {
    pub fn new(classifier: IntentClassifier, handlers: StudentHandlers) -> Self {
        Self {
            classifier,
            handlers,
        }
    }

    /// Run the full graph for one query. Infallible: every failure
    /// path ends in a terminal state with a non-empty trace.
    pub async fn run(&self, raw_query: &str) -> PipelineState {
        let mut state = PipelineState::new(raw_query);

        self.node_preprocess(&mut state);
        self.node_extract_id(&mut state);
        self.node_classify(&mut state).await;
        self.node_dispatch(&mut state).await;

        info!(
            "Routing graph done: intent={}, failed={}, trace_lines={}",
            state.intent,
            state.failed,
            state.trace.len()
        );
        state
    }

    fn node_preprocess(&self, state: &mut PipelineState) {
        state.cleaned_query = normalize(&state.raw_query);
        state.note(format!("Nội dung đã làm sạch: {}", state.cleaned_query));
    }

    fn node_extract_id(&self, state: &mut PipelineState) {
        state.student_id = extract_student_id(&state.cleaned_query);
        match &state.student_id {
            Some(id) => state.note(format!("Mã số sinh viên: {}", id)),
            None => state.note("Không tìm thấy mã sinh viên"),
        }
    }

    async fn node_classify(&self, state: &mut PipelineState) {
        state.intent = self.classifier.classify(&state.cleaned_query).await;
        state.note(format!("Intent xác định: {}", state.intent));
    }

    /// Single conditional dispatch on the classified intent. The
    /// `Unknown` arm is mandatory: an unmapped intent resolves to a
    /// clear unrouted reply instead of stalling.
    async fn node_dispatch(&self, state: &mut PipelineState) {
        match state.intent {
            Intent::StudentInfo => self.handlers.handle_student_info(state).await,
            Intent::StudentCredit => self.handlers.handle_student_credit(state).await,
            Intent::StudentLesson => self.handlers.handle_student_lesson(state).await,
            Intent::Unknown => {
                state.note("Xin lỗi, tôi chưa xác định được cách hỗ trợ cho câu hỏi này.");
                state.mark_failed();
            }
        }
    }
}
