//! Shared types for the campus assistant.
//!
//! Domain types (intents, conversation turns, student records) and the
//! HTTP request/response contract used by both campusd and campusctl.

pub mod rpc;
pub mod types;

pub use types::{
    ConversationTurn, CourseCredit, CreditSummary, EvaluationResult, Intent, Passage,
    RetrievalResult, SemesterCredits, StudentProfile,
};

/// Crate version, shared by daemon and client.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
