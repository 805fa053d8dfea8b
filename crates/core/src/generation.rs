use crate::error::BackendError;
use crate::models::Generation;
use crate::traits::GenerativeModel;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Generative client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiModel {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<Generation, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "gemini".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        parse_generation(&payload)
    }
}

fn parse_generation(payload: &Value) -> Result<Generation, BackendError> {
    let text = payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| BackendError::BackendResponse {
            backend: "gemini".to_string(),
            details: "response has no candidate text".to_string(),
        })?
        .to_string();

    // Token accounting is informational; its absence never fails the call.
    let total_tokens = payload
        .pointer("/usageMetadata/totalTokenCount")
        .and_then(Value::as_u64)
        .map(|count| count as u32);

    Ok(Generation { text, total_tokens })
}
