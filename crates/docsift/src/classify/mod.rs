//! Classification and structured extraction over extracted document text.

pub mod llm;

use async_trait::async_trait;
use serde_json::Value;

pub use llm::{LlmClassifier, LlmClient, LlmDeepExtractor};

/// First-pass classification: label the document and pull a structured
/// payload in one call. Implementations never fail; any backend problem
/// surfaces as the `simple_text` label with the input text as payload.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str, multi_page: bool) -> (String, Value);
}

/// Full-document extraction for multi-page bank statements. Returns
/// `Value::Null` on any backend or parse failure; the caller keeps the
/// first-pass result in that case.
#[async_trait]
pub trait DeepExtractor: Send + Sync {
    async fn extract(&self, full_text: &str) -> Value;
}

/// Strips markdown code fences the model tends to wrap JSON replies in.
pub fn clean_model_json(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_open = regex::RegexBuilder::new(r"^```(?:json)?\s*")
        .case_insensitive(true)
        .build()
        .map(|re| re.replace(trimmed, "").into_owned())
        .unwrap_or_else(|_| trimmed.to_string());
    let without_close = without_open
        .strip_suffix("```")
        .unwrap_or(&without_open)
        .to_string();
    without_close.trim().to_string()
}
