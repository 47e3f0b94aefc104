//! Student identifier extraction.
//!
//! A student id is one letter followed by exactly nine digits, as a
//! whole word. Absence is a normal outcome, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

static STUDENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z][0-9]{9}\b").expect("valid student id regex"));

/// Find a student id token in normalized text, upper-cased.
pub fn extract_student_id(text: &str) -> Option<String> {
    STUDENT_ID
        .find(text)
        .map(|m| m.as_str().to_uppercase())
}
