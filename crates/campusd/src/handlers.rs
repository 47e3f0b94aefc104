//! Structured-data handlers for the routing graph.
//!
//! Each handler fetches one record shape from the student store and
//! summarizes it against the question. Failures fold into the pipeline
//! trace; nothing here aborts the graph.

use crate::graph::PipelineState;
use crate::llm::TextGenerator;
use crate::store::StudentStore;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub struct StudentHandlers {
    generator: Arc<dyn TextGenerator>,
    students: Arc<dyn StudentStore>,
}

impl StudentHandlers {
    pub fn new(generator: Arc<dyn TextGenerator>, students: Arc<dyn StudentStore>) -> Self {
        Self { generator, students }
    }

    /// Profile lookup.
    pub async fn handle_student_info(&self, state: &mut PipelineState) {
        let Some(student_id) = self.require_student_id(state) else {
            return;
        };

        match self.students.profile(&student_id) {
            Ok(Some(profile)) => {
                self.summarize_into(state, &profile, "thông tin cá nhân").await;
            }
            Ok(None) => self.note_not_found(state, &student_id),
            Err(e) => self.note_lookup_error(state, e),
        }
    }

    /// Total accumulated credits with per-course breakdown.
    pub async fn handle_student_credit(&self, state: &mut PipelineState) {
        let Some(student_id) = self.require_student_id(state) else {
            return;
        };

        match self.students.total_credits(&student_id) {
            Ok(Some(summary)) => {
                self.summarize_into(state, &summary, "tín chỉ và môn học").await;
            }
            Ok(None) => self.note_not_found(state, &student_id),
            Err(e) => self.note_lookup_error(state, e),
        }
    }

    /// Credits for one semester; term and year come from the query.
    pub async fn handle_student_lesson(&self, state: &mut PipelineState) {
        let Some(student_id) = self.require_student_id(state) else {
            return;
        };

        let (term, year) = parse_semester(&state.cleaned_query);
        let (term, year) = match (term, year) {
            (Some(term), Some(year)) => (term, year),
            _ => {
                state.note("Thiếu thông tin học kỳ hoặc năm học trong câu hỏi (ví dụ: HK1 2024).");
                state.mark_failed();
                return;
            }
        };

        match self.students.semester_credits(&student_id, &term, &year) {
            Ok(Some(semester)) => {
                self.summarize_into(state, &semester, "lịch học và tín chỉ học kỳ").await;
            }
            Ok(None) => self.note_not_found(state, &student_id),
            Err(e) => self.note_lookup_error(state, e),
        }
    }

    /// Surface the missing-identifier case before any lookup happens.
    fn require_student_id(&self, state: &mut PipelineState) -> Option<String> {
        match &state.student_id {
            Some(id) => Some(id.clone()),
            None => {
                state.note("Không có mã sinh viên để tra cứu.");
                state.mark_failed();
                None
            }
        }
    }

    fn note_not_found(&self, state: &mut PipelineState, student_id: &str) {
        // Expected absence: trace note only, the graph stays healthy
        info!("No records for student {}", student_id);
        state.note(format!(
            "Không tìm thấy dữ liệu cho sinh viên {}.",
            student_id
        ));
    }

    fn note_lookup_error(&self, state: &mut PipelineState, error: crate::store::StoreError) {
        warn!("Student store lookup failed: {}", error);
        state.note(format!("Lỗi khi truy vấn dữ liệu: {}", error));
        state.mark_failed();
    }

    /// Summarize a fetched record against the question. The prompt
    /// pins the answer to the supplied data only.
    async fn summarize_into<T: Serialize>(
        &self,
        state: &mut PipelineState,
        record: &T,
        desc: &str,
    ) {
        let data = serde_json::to_string_pretty(record)
            .unwrap_or_else(|_| "{}".to_string());

        let prompt = format!(
            r#"Đây là dữ liệu {desc} của sinh viên:
{data}

Câu hỏi của người dùng: {question}

Hãy trích xuất và trả lời ngắn gọn, chính xác, chỉ dựa trên dữ liệu
được cung cấp ở trên. Nếu dữ liệu không chứa câu trả lời, hãy nói rõ
là không có thông tin."#,
            question = state.cleaned_query,
        );

        let outcome = self.generator.generate(&prompt).await;
        if outcome.ok {
            state.note(outcome.text);
        } else {
            warn!("Summarization failed: {}", outcome.text);
            state.note(format!(
                "Không tạo được câu trả lời từ dữ liệu: {}",
                outcome.text
            ));
            state.mark_failed();
        }
    }
}

static TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:hk|học kỳ|hoc ky|semester)\s*([1-3])\b").expect("valid term regex"));

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("valid year regex"));

/// Pull semester parameters out of the cleaned query.
pub fn parse_semester(query: &str) -> (Option<String>, Option<String>) {
    let term = TERM
        .captures(query)
        .map(|c| format!("HK{}", &c[1]));
    let year = YEAR.captures(query).map(|c| c[1].to_string());
    (term, year)
}
