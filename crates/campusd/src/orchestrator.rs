//! Two-tier answer orchestration.
//!
//! Retrieval always runs first (it also supplies the conversation
//! grounding). The evaluator decides whether that answer stands or the
//! structured routing graph gets a try. Whatever happens internally,
//! `answer` returns usable text - the contract is that it never fails.

use crate::evaluator::ResponseEvaluator;
use crate::graph::RoutingGraph;
use crate::retrieval::RetrievalPipeline;
use crate::store::TurnStore;
use campus_common::ConversationTurn;
use std::sync::Arc;
use tracing::{info, warn};

/// How many past turns are loaded per request.
const HISTORY_LIMIT: usize = 100;

/// Result of one orchestrated turn. `history` holds the turns that
/// existed before this exchange.
#[derive(Debug)]
pub struct ChatOutcome {
    pub answer: String,
    pub history: Vec<ConversationTurn>,
}

pub struct Orchestrator {
    retrieval: RetrievalPipeline,
    evaluator: ResponseEvaluator,
    graph: RoutingGraph,
    turns: Arc<dyn TurnStore>,
}

impl Orchestrator {
    pub fn new(
        retrieval: RetrievalPipeline,
        evaluator: ResponseEvaluator,
        graph: RoutingGraph,
        turns: Arc<dyn TurnStore>,
    ) -> Self {
        Self {
            retrieval,
            evaluator,
            graph,
            turns,
        }
    }

    /// Answer one user turn. Infallible by contract: every internal
    /// failure degrades to the best available text.
    pub async fn answer(&self, session_id: &str, question: &str) -> ChatOutcome {
        let history = self
            .turns
            .recent_turns(session_id, HISTORY_LIMIT)
            .unwrap_or_else(|e| {
                warn!("Could not load history for {}: {}", session_id, e);
                vec![]
            });

        let retrieval = self.retrieval.answer(question, &history).await;
        let evaluation = self.evaluator.evaluate(question, &retrieval.answer).await;

        let answer = if evaluation.is_sufficient && !evaluation.needs_student_data {
            info!("Using retrieval answer ({})", evaluation.reason);
            retrieval.answer
        } else {
            info!(
                "Escalating to routing graph (is_sufficient={}, needs_student_data={})",
                evaluation.is_sufficient, evaluation.needs_student_data
            );
            let state = self.graph.run(question).await;
            let graph_reply = state.reply();

            if !graph_reply.trim().is_empty() && !state.failed() {
                info!("Using routing graph reply");
                graph_reply
            } else {
                // Graph could not do better: the retrieval answer wins
                // even if the evaluator disliked it
                info!("Routing graph degraded, keeping retrieval answer");
                retrieval.answer
            }
        };

        if let Err(e) = self.turns.persist_turn(session_id, question, &answer) {
            warn!("Could not persist turn for {}: {}", session_id, e);
        }

        ChatOutcome { answer, history }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalConfig;
    use crate::graph::RoutingGraph;
    use crate::handlers::StudentHandlers;
    use crate::intent::IntentClassifier;
    use crate::llm::testing::ScriptedGenerator;
    use crate::llm::GenerateOutcome;
    use crate::store::students::SqliteStudentStore;
    use crate::store::turns::SqliteTurnStore;
    use crate::store::{open_in_memory, SqliteDocumentIndex};

    const SUFFICIENT: &str =
        r#"{"is_sufficient": true, "reason": "good", "needs_student_data": false}"#;
    const NEEDS_DATA: &str =
        r#"{"is_sufficient": false, "reason": "student data", "needs_student_data": true}"#;

    /// Full orchestrator over in-memory stores, an empty document
    /// index and one scripted generator shared by every component.
    ///
    /// Generation call order with no history: grounded answer,
    /// evaluation, then (if escalated) classification, summarization.
    fn orchestrator(generator: Arc<ScriptedGenerator>) -> Orchestrator {
        let db = open_in_memory().unwrap();

        let students = SqliteStudentStore::new(db.clone());
        students
            .upsert_student("K123456789", "Lê Văn C", "CNTT03", &serde_json::json!({}))
            .unwrap();
        students
            .insert_course_credit("CNTT03", "MATH101", 3, "HK1", "2024")
            .unwrap();

        let index = Arc::new(SqliteDocumentIndex::new(db.clone(), generator.clone()));
        let turns = Arc::new(SqliteTurnStore::new(db));

        Orchestrator::new(
            RetrievalPipeline::new(generator.clone(), index, &RetrievalConfig::default()),
            ResponseEvaluator::new(generator.clone()),
            RoutingGraph::new(
                IntentClassifier::new(generator.clone()),
                StudentHandlers::new(generator, Arc::new(students)),
            ),
            turns,
        )
    }

    #[tokio::test]
    async fn test_sufficient_retrieval_answer_is_returned_exactly() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            GenerateOutcome::success("Học phí đóng vào tháng 9."),
            GenerateOutcome::success(SUFFICIENT),
        ]));
        let orch = orchestrator(generator);

        let outcome = orch.answer("s1", "khi nào đóng học phí").await;
        assert_eq!(outcome.answer, "Học phí đóng vào tháng 9.");
    }

    #[tokio::test]
    async fn test_escalation_prefers_graph_reply() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            GenerateOutcome::success("Tôi không có thông tin đó."),
            GenerateOutcome::success(NEEDS_DATA),
            GenerateOutcome::success("student_credit"),
            GenerateOutcome::success("Tổng số tín chỉ: 3."),
        ]));
        let orch = orchestrator(generator);

        let outcome = orch
            .answer("s1", "tổng số tín chỉ của sinh viên K123456789")
            .await;
        assert!(outcome.answer.contains("Tổng số tín chỉ: 3."));
        assert!(outcome.answer.contains("Mã số sinh viên: K123456789"));
    }

    #[tokio::test]
    async fn test_failed_graph_falls_back_to_retrieval_answer() {
        // Unknown intent marks the graph reply as failed
        let generator = Arc::new(ScriptedGenerator::new(vec![
            GenerateOutcome::success("Câu trả lời từ tài liệu."),
            GenerateOutcome::success(NEEDS_DATA),
            GenerateOutcome::success("nonsense_intent"),
        ]));
        let orch = orchestrator(generator);

        let outcome = orch.answer("s1", "câu hỏi kỳ lạ").await;
        assert_eq!(outcome.answer, "Câu trả lời từ tài liệu.");
    }

    #[tokio::test]
    async fn test_unknown_student_still_returns_text() {
        // Structured fetch finds nothing: trace ends in a not-found
        // note and the user still gets non-empty text
        let generator = Arc::new(ScriptedGenerator::new(vec![
            GenerateOutcome::success("Tôi không có thông tin đó."),
            GenerateOutcome::success(NEEDS_DATA),
            GenerateOutcome::success("student_credit"),
        ]));
        let orch = orchestrator(generator);

        let outcome = orch
            .answer("s1", "tổng số tín chỉ của sinh viên K999999999")
            .await;
        assert!(!outcome.answer.is_empty());
        assert!(outcome
            .answer
            .contains("Không tìm thấy dữ liệu cho sinh viên K999999999"));
    }

    #[tokio::test]
    async fn test_evaluation_failure_takes_conservative_path() {
        // Evaluator call fails: conservative fallback escalates, graph
        // also degrades (unknown intent), retrieval answer survives
        let generator = Arc::new(ScriptedGenerator::new(vec![
            GenerateOutcome::success("Câu trả lời tài liệu."),
            GenerateOutcome::failure("evaluator offline"),
            GenerateOutcome::success("garbage"),
        ]));
        let orch = orchestrator(generator);

        let outcome = orch.answer("s1", "một câu hỏi").await;
        assert_eq!(outcome.answer, "Câu trả lời tài liệu.");
    }

    #[tokio::test]
    async fn test_history_excludes_current_turn() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            GenerateOutcome::success("trả lời 1"),
            GenerateOutcome::success(SUFFICIENT),
            // Second turn: enhancement, answer, evaluation
            GenerateOutcome::success("câu hỏi độc lập"),
            GenerateOutcome::success("trả lời 2"),
            GenerateOutcome::success(SUFFICIENT),
        ]));
        let orch = orchestrator(generator);

        let first = orch.answer("s1", "câu hỏi 1").await;
        assert!(first.history.is_empty());

        let second = orch.answer("s1", "câu hỏi 2").await;
        assert_eq!(second.history.len(), 1);
        assert_eq!(second.history[0].user_text, "câu hỏi 1");
        assert_eq!(second.history[0].bot_text, "trả lời 1");
    }

    #[tokio::test]
    async fn test_answer_is_never_empty() {
        // Worst case: every capability call fails
        let generator = Arc::new(ScriptedGenerator::failing("everything is down"));
        let orch = orchestrator(generator);

        let outcome = orch.answer("s1", "câu hỏi").await;
        assert!(!outcome.answer.trim().is_empty());
    }
}
