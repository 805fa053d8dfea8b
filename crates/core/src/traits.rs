use crate::error::BackendError;
use crate::models::{ChunkUpsert, Generation, RetrievedChunk};
use async_trait::async_trait;

#[async_trait]
pub trait Embedder {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;
}

#[async_trait]
pub trait VectorIndex {
    async fn upsert_chunks(&self, chunks: &[ChunkUpsert]) -> Result<(), BackendError>;

    async fn query(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, BackendError>;
}

#[async_trait]
pub trait GenerativeModel {
    async fn generate(&self, prompt: &str) -> Result<Generation, BackendError>;
}
