use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of running a document through the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The content hash was already present in the ledger; nothing was done.
    AlreadyIndexed,
    /// The document parsed but yielded no text; nothing was indexed or recorded.
    NoExtractableText,
    /// Every chunk was embedded and upserted, and the hash recorded.
    Indexed { chunk_count: usize },
}

/// A chunk ready for upsert: its text, embedding, and payload metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkUpsert {
    pub text: String,
    pub embedding: Vec<f32>,
    pub filename: String,
    pub chunk_index: usize,
    pub ingested_at: DateTime<Utc>,
}

/// A chunk returned by a vector index similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub score: f64,
    pub text: String,
}

/// Raw output of a generative model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    /// Total tokens billed for the call, when the backend reports them.
    pub total_tokens: Option<u32>,
}

/// Final answer returned to the caller, after any configured obfuscation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub answer: String,
    pub tokens_used: Option<u32>,
}
