//! Gemini-style REST backend for classification and deep extraction.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::schema::DocKind;

use super::{clean_model_json, Classifier, DeepExtractor};

const API_KEY_ENV: &str = "GENAI_API_KEY";

/// Thin client over the `generateContent` endpoint. One instance is shared
/// by the classifier and the deep extractor.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl LlmClient {
    /// Reads the API key from `GENAI_API_KEY`. A missing key is not fatal
    /// here; requests will fail and callers degrade per their contract.
    pub fn from_config(config: &LlmConfig) -> Self {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_else(|_| {
            warn!("{} is not set; model calls will fail and documents will degrade to simple text", API_KEY_ENV);
            String::new()
        });

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    #[cfg(test)]
    pub fn with_base(api_base: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_base, model, self.api_key
        );
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", model, e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("{} returned {}: {}", model, status, detail));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("{} reply was not valid JSON: {}", model, e))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| format!("{} reply carried no candidates", model))
    }
}

/// Classifies a document from its (possibly truncated) extracted text.
pub struct LlmClassifier {
    client: LlmClient,
    model: String,
}

impl LlmClassifier {
    pub fn new(client: LlmClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    fn build_prompt(&self, text: &str, multi_page: bool) -> String {
        let page_context = if multi_page {
            "the first page of a multi-page document"
        } else {
            "a single-page document"
        };

        let mut schema_lines = String::new();
        for kind in DocKind::all() {
            schema_lines.push_str(&format!("- {}: {}\n", kind.as_str(), kind.schema_hint()));
        }

        format!(
            "You are a document classification and data extraction system.\n\
             The text below was extracted from {page_context}.\n\n\
             Classify it as exactly one of these document types and extract the\n\
             corresponding structured data:\n{schema_lines}\n\
             Respond with only a JSON object of the form:\n\
             {{\"document_type\": \"<type>\", \"extracted_data\": {{...}}}}\n\n\
             If the document fits no structured type, use \"simple_text\" with the\n\
             full text under \"extracted_text\".\n\n\
             Document text:\n{text}"
        )
    }

    fn fallback(text: &str) -> (String, Value) {
        ("simple_text".to_string(), json!({"extracted_text": text}))
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, text: &str, multi_page: bool) -> (String, Value) {
        let prompt = self.build_prompt(text, multi_page);

        let reply = match self.client.generate(&self.model, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Classification call failed: {}", e);
                return Self::fallback(text);
            }
        };

        let cleaned = clean_model_json(&reply);
        let parsed: Value = match serde_json::from_str(&cleaned) {
            Ok(value) => value,
            Err(e) => {
                warn!("Classifier reply was not parseable JSON: {}", e);
                return Self::fallback(text);
            }
        };

        let label = parsed
            .get("document_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if label.is_empty() {
            warn!("Classifier reply carried no document_type");
            return Self::fallback(text);
        }

        let payload = parsed.get("extracted_data").cloned().unwrap_or(Value::Null);
        debug!("Classifier labeled document as '{}'", label);
        (label, payload)
    }
}

/// Runs a second, thorough pass over the complete text of a multi-page bank
/// statement with the stronger model tier.
pub struct LlmDeepExtractor {
    client: LlmClient,
    model: String,
}

impl LlmDeepExtractor {
    pub fn new(client: LlmClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    fn build_prompt(full_text: &str) -> String {
        format!(
            "You are a meticulous financial data extraction system.\n\
             The text below is a complete bank statement spanning multiple pages.\n\
             Extract every transaction from every page. Respond with only a JSON\n\
             object of this shape:\n\
             {}\n\n\
             Statement text:\n{}",
            DocKind::BankStatement.schema_hint(),
            full_text
        )
    }
}

#[async_trait]
impl DeepExtractor for LlmDeepExtractor {
    async fn extract(&self, full_text: &str) -> Value {
        let prompt = Self::build_prompt(full_text);

        let reply = match self.client.generate(&self.model, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Deep extraction call failed: {}", e);
                return Value::Null;
            }
        };

        match serde_json::from_str(&clean_model_json(&reply)) {
            Ok(value) => value,
            Err(e) => {
                warn!("Deep extraction reply was not parseable JSON: {}", e);
                Value::Null
            }
        }
    }
}
