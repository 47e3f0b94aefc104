//! Intent classification.
//!
//! Maps a cleaned query to one of the routable intents via a single
//! generation call. Any malformed or failed output degrades to
//! `Intent::Unknown` - misclassification is tolerable, a crash is not.

use crate::llm::TextGenerator;
use campus_common::Intent;
use std::sync::Arc;
use tracing::{info, warn};

pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Classify a query. Never fails.
    pub async fn classify(&self, cleaned_query: &str) -> Intent {
        let prompt = build_classification_prompt(cleaned_query);
        let outcome = self.generator.generate(&prompt).await;

        if !outcome.ok {
            warn!("Intent classification call failed: {}", outcome.text);
            return Intent::Unknown;
        }

        let intent = Intent::from_label(&outcome.text);
        if intent == Intent::Unknown {
            warn!("Classifier emitted unrecognized label: {:?}", outcome.text.trim());
        } else {
            info!("Classified intent: {}", intent);
        }
        intent
    }
}

fn build_classification_prompt(query: &str) -> String {
    let mut labels = String::new();
    for intent in Intent::ROUTABLE {
        labels.push_str(&format!("  {} — {}\n", intent.label(), intent.description()));
    }

    format!(
        r#"Bạn là bộ phân loại ý định của hệ thống chatbot đại học.

Phân loại câu hỏi người dùng vào duy nhất một trong các nhóm ý định sau:
{labels}
Quy tắc:
- Chỉ trả về đúng một key hợp lệ trong danh sách trên.
- Không mô tả lại, không thêm ký tự, không viết hoa, không dịch.
- Nếu câu hỏi liên quan đến nhiều nhóm, chọn nhóm phù hợp nhất.

Câu hỏi: {query}

Trả lời (một dòng, chỉ chứa key):"#
    )
}
