use crate::chunking::{split_into_chunks, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::PdfExtractor;
use crate::ledger::HashLedger;
use crate::models::{ChunkUpsert, IngestOutcome};
use crate::traits::{Embedder, VectorIndex};
use chrono::Utc;
use sha2::{Digest, Sha256};

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Ingestion pipeline: dedup by content hash, extract, chunk, embed, upsert.
///
/// The hash is recorded only after every chunk has been upserted. A failure
/// partway through leaves earlier chunks in the store and the hash
/// unrecorded, so a retry re-indexes the whole document; nothing is rolled
/// back.
pub struct IngestPipeline<X, E, V> {
    extractor: X,
    embedder: E,
    store: V,
    ledger: HashLedger,
    chunking: ChunkingConfig,
}

impl<X, E, V> IngestPipeline<X, E, V>
where
    X: PdfExtractor + Send + Sync,
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn new(
        extractor: X,
        embedder: E,
        store: V,
        ledger: HashLedger,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            extractor,
            embedder,
            store,
            ledger,
            chunking,
        }
    }

    pub async fn ingest(&self, bytes: &[u8], filename: &str) -> Result<IngestOutcome, IngestError> {
        let hash = digest_bytes(bytes);

        if self.ledger.contains(&hash).await? {
            return Ok(IngestOutcome::AlreadyIndexed);
        }

        let text = self.extractor.extract(bytes)?;
        if text.trim().is_empty() {
            return Ok(IngestOutcome::NoExtractableText);
        }

        let chunks = split_into_chunks(&text, self.chunking)?;
        let ingested_at = Utc::now();

        let mut upserts = Vec::with_capacity(chunks.len());
        for (chunk_index, chunk_text) in chunks.into_iter().enumerate() {
            let embedding = self.embedder.embed(&chunk_text).await?;
            upserts.push(ChunkUpsert {
                text: chunk_text,
                embedding,
                filename: filename.to_string(),
                chunk_index,
                ingested_at,
            });
        }

        self.store.upsert_chunks(&upserts).await?;

        let chunk_count = upserts.len();
        self.ledger.record(&hash).await?;

        Ok(IngestOutcome::Indexed { chunk_count })
    }
}

#[cfg(test)]
mod tests {
    use super::{digest_bytes, IngestPipeline};
    use crate::chunking::ChunkingConfig;
    use crate::error::{BackendError, IngestError};
    use crate::extractor::PdfExtractor;
    use crate::ledger::HashLedger;
    use crate::models::{ChunkUpsert, IngestOutcome, RetrievedChunk};
    use crate::traits::{Embedder, VectorIndex};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    struct FakeExtractor {
        text: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl PdfExtractor for FakeExtractor {
        fn extract(&self, _bytes: &[u8]) -> Result<String, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.to_string())
        }
    }

    struct FakeEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        fn dimensions(&self) -> usize {
            4
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, BackendError> {
            if self.fail {
                return Err(BackendError::Request("embedding down".to_string()));
            }
            Ok(vec![0.0; 4])
        }
    }

    #[derive(Clone, Default)]
    struct RecordingStore {
        upserts: Arc<Mutex<Vec<ChunkUpsert>>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingStore {
        async fn upsert_chunks(&self, chunks: &[ChunkUpsert]) -> Result<(), BackendError> {
            self.upserts.lock().unwrap().extend_from_slice(chunks);
            Ok(())
        }

        async fn query(
            &self,
            _query_vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<RetrievedChunk>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn pipeline(
        text: &'static str,
        fail_embedding: bool,
        ledger: HashLedger,
    ) -> (
        IngestPipeline<FakeExtractor, FakeEmbedder, RecordingStore>,
        Arc<AtomicUsize>,
        RecordingStore,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = RecordingStore::default();
        let pipeline = IngestPipeline::new(
            FakeExtractor {
                text,
                calls: calls.clone(),
            },
            FakeEmbedder {
                fail: fail_embedding,
            },
            store.clone(),
            ledger,
            ChunkingConfig {
                max_chars: 10,
                overlap_chars: 2,
            },
        );
        (pipeline, calls, store)
    }

    #[test]
    fn digest_is_stable_and_distinguishes_inputs() {
        assert_eq!(digest_bytes(b"abc"), digest_bytes(b"abc"));
        assert_ne!(digest_bytes(b"abc"), digest_bytes(b"abd"));
    }

    #[tokio::test]
    async fn known_hash_short_circuits_without_side_effects(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ledger = HashLedger::new(dir.path().join("hashes.txt"));
        ledger.record(&digest_bytes(b"doc")).await?;

        let (pipeline, calls, store) = pipeline("some text", false, ledger);
        let outcome = pipeline.ingest(b"doc", "doc.pdf").await?;

        assert_eq!(outcome, IngestOutcome::AlreadyIndexed);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.upserts.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn empty_text_is_not_indexed_or_recorded() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ledger = HashLedger::new(dir.path().join("hashes.txt"));

        let (pipeline, _calls, store) = pipeline("   \n ", false, ledger.clone());
        let outcome = pipeline.ingest(b"doc", "doc.pdf").await?;

        assert_eq!(outcome, IngestOutcome::NoExtractableText);
        assert!(store.upserts.lock().unwrap().is_empty());
        assert!(!ledger.contains(&digest_bytes(b"doc")).await?);
        Ok(())
    }

    #[tokio::test]
    async fn successful_ingestion_upserts_chunks_and_records_the_hash(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ledger = HashLedger::new(dir.path().join("hashes.txt"));

        // 26 chars, stride 8: windows start at 0, 8, 16 and the last one
        // reaches the end of the text.
        let (pipeline, _calls, store) =
            pipeline("abcdefghijklmnopqrstuvwxyz", false, ledger.clone());
        let outcome = pipeline.ingest(b"doc", "doc.pdf").await?;

        assert_eq!(outcome, IngestOutcome::Indexed { chunk_count: 3 });
        assert!(ledger.contains(&digest_bytes(b"doc")).await?);

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 3);
        assert!(upserts.iter().all(|chunk| chunk.filename == "doc.pdf"));
        assert_eq!(upserts[2].chunk_index, 2);
        Ok(())
    }

    #[tokio::test]
    async fn embedding_failure_leaves_the_hash_unrecorded(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ledger = HashLedger::new(dir.path().join("hashes.txt"));

        let (pipeline, _calls, _store) = pipeline("some text", true, ledger.clone());
        let result = pipeline.ingest(b"doc", "doc.pdf").await;

        assert!(matches!(result, Err(IngestError::Indexing(_))));
        assert!(!ledger.contains(&digest_bytes(b"doc")).await?);
        Ok(())
    }
}
