use crate::error::BackendError;
use crate::models::{ChunkUpsert, RetrievedChunk};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

const PINECONE_CONTROL_PLANE: &str = "https://api.pinecone.io";

/// Vector index client for a single Pinecone serverless index.
///
/// `ensure_index` must run before any data-plane call: it provisions the
/// index if missing and resolves the per-index data-plane host.
#[derive(Clone)]
pub struct PineconeStore {
    client: Client,
    control_url: String,
    api_key: String,
    index_name: String,
    dimensions: usize,
    host: Option<Url>,
}

impl PineconeStore {
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            control_url: PINECONE_CONTROL_PLANE.to_string(),
            api_key: api_key.into(),
            index_name: index_name.into(),
            dimensions,
            host: None,
        }
    }

    pub fn with_control_url(mut self, control_url: impl Into<String>) -> Self {
        self.control_url = control_url.into();
        self
    }

    /// Creates the index if it does not exist and resolves its data-plane host.
    pub async fn ensure_index(&mut self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(format!("{}/indexes/{}", self.control_url, self.index_name))
            .header("Api-Key", &self.api_key)
            .send()
            .await?;

        let described = match response.status() {
            status if status.is_success() => response.json::<Value>().await?,
            StatusCode::NOT_FOUND => self.create_index().await?,
            status => {
                return Err(BackendError::BackendResponse {
                    backend: "pinecone".to_string(),
                    details: status.to_string(),
                })
            }
        };

        let host = described
            .pointer("/host")
            .and_then(Value::as_str)
            .ok_or_else(|| BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: "index description has no host".to_string(),
            })?;

        self.host = Some(Url::parse(&format!("https://{host}"))?);
        Ok(())
    }

    async fn create_index(&self) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(format!("{}/indexes", self.control_url))
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "name": self.index_name,
                "dimension": self.dimensions,
                "metric": "cosine",
                "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(response.json().await?)
    }

    fn data_url(&self, path: &str) -> Result<String, BackendError> {
        let host = self.host.as_ref().ok_or_else(|| {
            BackendError::NotReady(format!(
                "index {} host not resolved; call ensure_index first",
                self.index_name
            ))
        })?;
        Ok(format!("{}{}", host.as_str().trim_end_matches('/'), path))
    }
}

#[async_trait]
impl VectorIndex for PineconeStore {
    async fn upsert_chunks(&self, chunks: &[ChunkUpsert]) -> Result<(), BackendError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let vectors = chunks
            .iter()
            .map(|chunk| {
                if chunk.embedding.len() != self.dimensions {
                    return Err(BackendError::Request(format!(
                        "embedding dimension {} != {}",
                        chunk.embedding.len(),
                        self.dimensions
                    )));
                }

                Ok(json!({
                    "id": Uuid::new_v4().to_string(),
                    "values": chunk.embedding,
                    "metadata": {
                        "text": chunk.text,
                        "filename": chunk.filename,
                        "chunk_index": chunk.chunk_index,
                        "ingested_at": chunk.ingested_at.to_rfc3339(),
                    },
                }))
            })
            .collect::<Result<Vec<_>, BackendError>>()?;

        let response = self
            .client
            .post(self.data_url("/vectors/upsert")?)
            .header("Api-Key", &self.api_key)
            .json(&json!({ "vectors": vectors }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn query(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, BackendError> {
        if query_vector.len() != self.dimensions {
            return Err(BackendError::Request(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                self.dimensions
            )));
        }

        let response = self
            .client
            .post(self.data_url("/query")?)
            .header("Api-Key", &self.api_key)
            .json(&json!({
                "vector": query_vector,
                "topK": top_k,
                "includeMetadata": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "pinecone".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parse_matches(&parsed))
    }
}

fn parse_matches(payload: &Value) -> Vec<RetrievedChunk> {
    let hits = payload
        .pointer("/matches")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    hits.iter()
        .map(|hit| RetrievedChunk {
            id: hit
                .pointer("/id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            score: hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0),
            text: hit
                .pointer("/metadata/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}
