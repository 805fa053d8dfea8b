mod server;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use pdf_assistant_core::{
    AnswerCoordinator, CaesarCipher, ChunkingConfig, GeminiEmbedder, GeminiModel, HashLedger,
    IngestPipeline, LopdfExtractor, PineconeStore,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-assistant-server", version)]
struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind: String,

    /// Path of the append-only content-hash ledger file.
    #[arg(long, env = "LEDGER_PATH", default_value = "hashes.txt")]
    ledger_path: String,

    /// Pinecone index name.
    #[arg(long, env = "PINECONE_INDEX", default_value = "asistente")]
    index_name: String,

    /// Embedding vector dimensionality; must match the index.
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value = "768")]
    embedding_dimensions: usize,

    /// Gemini embedding model.
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "models/embedding-001")]
    embedding_model: String,

    /// Gemini generative model.
    #[arg(long, env = "GENERATION_MODEL", default_value = "gemini-2.5-flash")]
    generation_model: String,

    /// Maximum characters per chunk.
    #[arg(long, env = "CHUNK_MAX_CHARS", default_value = "1500")]
    chunk_max_chars: usize,

    /// Characters shared between consecutive chunks.
    #[arg(long, env = "CHUNK_OVERLAP_CHARS", default_value = "400")]
    chunk_overlap_chars: usize,

    /// Number of chunks retrieved per question.
    #[arg(long, env = "TOP_K", default_value = "4")]
    top_k: usize,

    /// Pass answers through the substitution cipher before returning them.
    #[arg(long, default_value_t = false)]
    obfuscate_answers: bool,

    /// Shift used by the answer substitution cipher.
    #[arg(long, env = "CIPHER_SHIFT", default_value = "3")]
    cipher_shift: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let google_api_key =
        std::env::var("GOOGLE_API_KEY").context("GOOGLE_API_KEY environment variable not set")?;
    let pinecone_api_key = std::env::var("PINECONE_API_KEY")
        .context("PINECONE_API_KEY environment variable not set")?;

    let chunking = ChunkingConfig {
        max_chars: cli.chunk_max_chars,
        overlap_chars: cli.chunk_overlap_chars,
    };
    chunking
        .validate()
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let embedder = GeminiEmbedder::new(
        &google_api_key,
        &cli.embedding_model,
        cli.embedding_dimensions,
    );
    let model = GeminiModel::new(&google_api_key, &cli.generation_model);

    let mut store = PineconeStore::new(
        &pinecone_api_key,
        &cli.index_name,
        cli.embedding_dimensions,
    );
    store
        .ensure_index()
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    let ledger = HashLedger::new(&cli.ledger_path);
    let ingest = IngestPipeline::new(
        LopdfExtractor,
        embedder.clone(),
        store.clone(),
        ledger,
        chunking,
    );

    let mut answer = AnswerCoordinator::new(embedder, store, model).with_top_k(cli.top_k);
    if cli.obfuscate_answers {
        answer = answer.with_obfuscation(CaesarCipher::new(cli.cipher_shift));
    }

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        index = %cli.index_name,
        ledger = %cli.ledger_path,
        "pdf-assistant boot"
    );

    server::serve(&cli.bind, server::AppState::new(ingest, answer)).await
}
