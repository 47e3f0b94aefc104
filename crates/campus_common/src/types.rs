//! Core domain types shared between the daemon and the CLI client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of question intents the routing graph can dispatch on.
///
/// Anything the classifier emits outside this set normalizes to
/// `Unknown`, which has no routing edge and short-circuits with an
/// "unrouted" reply instead of crashing the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Look up a student's profile record
    StudentInfo,
    /// Look up total accumulated credits with per-course breakdown
    StudentCredit,
    /// Look up credits for one semester (term + year)
    StudentLesson,
    /// Not classifiable - never routed
    Unknown,
}

impl Intent {
    /// The three intents that have a routing edge.
    pub const ROUTABLE: [Intent; 3] = [
        Intent::StudentInfo,
        Intent::StudentCredit,
        Intent::StudentLesson,
    ];

    /// Parse a classifier label. Unrecognized or empty input maps to
    /// `Unknown` - this is the safety net for malformed LLM output.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "student_info" => Self::StudentInfo,
            "student_credit" => Self::StudentCredit,
            "student_lesson" => Self::StudentLesson,
            _ => Self::Unknown,
        }
    }

    /// Wire label, matching the classifier prompt vocabulary.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StudentInfo => "student_info",
            Self::StudentCredit => "student_credit",
            Self::StudentLesson => "student_lesson",
            Self::Unknown => "unknown",
        }
    }

    /// Natural-language description used in the classification prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Self::StudentInfo => "tra cứu thông tin sinh viên",
            Self::StudentCredit => "tra cứu tín chỉ sinh viên",
            Self::StudentLesson => "tra cứu lịch học của sinh viên",
            Self::Unknown => "không xác định",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One recorded chat exchange. Immutable once persisted; history is
/// returned most-recent-last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_text: String,
    pub bot_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Verdict on whether a retrieval answer is good enough to return.
///
/// Produced once per orchestrator invocation and never mutated. On any
/// malformed evaluator output this defaults to the conservative
/// `{false, false, reason}` so the structured path gets attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub is_sufficient: bool,
    pub needs_student_data: bool,
    pub reason: String,
}

impl EvaluationResult {
    /// Conservative fallback: insufficient, try the structured path.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            is_sufficient: false,
            needs_student_data: false,
            reason: reason.into(),
        }
    }
}

/// A passage retrieved from the document index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Document the passage came from
    pub source: String,
    pub text: String,
    /// Cosine similarity against the query embedding
    pub score: f32,
}

/// Output of the retrieval pipeline. `answer` is always non-empty;
/// `documents` may be empty when nothing matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub answer: String,
    pub documents: Vec<Passage>,
}

/// A student's profile record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_id: String,
    pub full_name: String,
    pub class_code: String,
    /// Free-form fields (date of birth, major, email, ...)
    #[serde(default)]
    pub details: serde_json::Value,
}

/// One course's credit contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseCredit {
    pub course_code: String,
    pub credits: u32,
}

/// Total accumulated credits for a student, with breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditSummary {
    pub student_id: String,
    pub class_code: String,
    pub total_credits: u32,
    pub courses: Vec<CourseCredit>,
}

/// Credits for one semester of a student's class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemesterCredits {
    pub student_id: String,
    pub class_code: String,
    pub term: String,
    pub year: String,
    pub total_credits: u32,
    pub courses: Vec<CourseCredit>,
}
