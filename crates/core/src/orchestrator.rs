use crate::cipher::CaesarCipher;
use crate::error::BackendError;
use crate::models::{AnswerOutcome, RetrievedChunk};
use crate::traits::{Embedder, GenerativeModel, VectorIndex};

pub const DEFAULT_TOP_K: usize = 4;

const LANGUAGE_INSTRUCTION: &str = "\nResponde en español.";

/// Retrieval-augmented answer pipeline.
///
/// Embeds the question, fetches the top-K most similar chunks from the
/// vector index, and conditions the generative model on them. Stateless
/// across calls: every question is answered independently.
pub struct AnswerCoordinator<E, V, G>
where
    E: Embedder,
    V: VectorIndex,
    G: GenerativeModel,
{
    embedder: E,
    index: V,
    model: G,
    top_k: usize,
    obfuscation: Option<CaesarCipher>,
}

impl<E, V, G> AnswerCoordinator<E, V, G>
where
    E: Embedder + Send + Sync,
    V: VectorIndex + Send + Sync,
    G: GenerativeModel + Send + Sync,
{
    pub fn new(embedder: E, index: V, model: G) -> Self {
        Self {
            embedder,
            index,
            model,
            top_k: DEFAULT_TOP_K,
            obfuscation: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_obfuscation(mut self, cipher: CaesarCipher) -> Self {
        self.obfuscation = Some(cipher);
        self
    }

    pub async fn answer(&self, question: &str) -> Result<AnswerOutcome, BackendError> {
        if question.trim().is_empty() {
            return Err(BackendError::Request("question is empty".to_string()));
        }

        let query_vector = self.embedder.embed(question).await?;
        let chunks = self.index.query(&query_vector, self.top_k).await?;

        let prompt = build_prompt(&chunks, question);
        let generation = self.model.generate(&prompt).await?;

        let answer = match &self.obfuscation {
            Some(cipher) => cipher.apply(&generation.text),
            None => generation.text,
        };

        Ok(AnswerOutcome {
            answer,
            tokens_used: generation.total_tokens,
        })
    }
}

fn build_prompt(chunks: &[RetrievedChunk], question: &str) -> String {
    let mut prompt =
        String::from("Usa el siguiente contexto para responder la pregunta.\n\nContexto:\n");

    for chunk in chunks {
        prompt.push_str(&chunk.text);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Pregunta: ");
    prompt.push_str(question);
    prompt.push_str(LANGUAGE_INSTRUCTION);
    prompt
}
