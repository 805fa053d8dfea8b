pub mod chunking;
pub mod cipher;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod stores;
pub mod traits;

pub use chunking::{split_into_chunks, ChunkingConfig};
pub use cipher::{CaesarCipher, DEFAULT_CIPHER_SHIFT};
pub use embeddings::{GeminiEmbedder, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL};
pub use error::{BackendError, IngestError};
pub use extractor::{LopdfExtractor, PdfExtractor};
pub use generation::{GeminiModel, DEFAULT_GENERATION_MODEL};
pub use ingest::{digest_bytes, IngestPipeline};
pub use ledger::HashLedger;
pub use models::{AnswerOutcome, ChunkUpsert, Generation, IngestOutcome, RetrievedChunk};
pub use orchestrator::{AnswerCoordinator, DEFAULT_TOP_K};
pub use stores::PineconeStore;
pub use traits::{Embedder, GenerativeModel, VectorIndex};
