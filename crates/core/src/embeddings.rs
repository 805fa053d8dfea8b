use crate::error::BackendError;
use crate::traits::Embedder;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Embedding client for the Gemini `embedContent` endpoint.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/{}:embedContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "model": self.model,
                "content": { "parts": [{ "text": text }] },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "gemini-embeddings".to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        parse_embedding(&payload)
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, BackendError> {
    let values = payload
        .pointer("/embedding/values")
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::BackendResponse {
            backend: "gemini-embeddings".to_string(),
            details: "response has no embedding values".to_string(),
        })?;

    Ok(values
        .iter()
        .map(|value| value.as_f64().unwrap_or(0.0) as f32)
        .collect())
}
