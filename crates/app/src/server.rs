//! HTTP surface of the PDF assistant.
//!
//! Two operations: `POST /upload` ingests a PDF (multipart or base64 JSON)
//! and `POST /ask` answers a question over the indexed content. Both accept
//! cross-origin requests from any origin. Validation failures return `400`
//! with a flat `{"error": "..."}` body; downstream failures are logged and
//! mapped to a generic `500`. Requests are stateless end-to-end.

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use pdf_assistant_core::{
    AnswerCoordinator, GeminiEmbedder, GeminiModel, IngestOutcome, IngestPipeline, LopdfExtractor,
    PineconeStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const MSG_NO_FILE: &str = "No se proporcionó archivo";
const MSG_EMPTY_FILENAME: &str = "Nombre de archivo vacío";
const MSG_MUST_BE_PDF: &str = "El archivo debe ser PDF";
const MSG_NO_TEXT: &str = "No se pudo extraer texto del PDF";
const MSG_ALREADY_INDEXED: &str = "El archivo ya fue vectorizado anteriormente";
const MSG_INDEXED: &str = "Documento vectorizado correctamente";
const MSG_QUESTION_REQUIRED: &str = "Se requiere una pregunta";
const MSG_INVALID_BASE64: &str = "El campo file no es base64 válido";

pub type ServerIngest = IngestPipeline<LopdfExtractor, GeminiEmbedder, PineconeStore>;
pub type ServerAnswer = AnswerCoordinator<GeminiEmbedder, PineconeStore, GeminiModel>;

/// Service context built once at startup and reused for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    ingest: Arc<ServerIngest>,
    answer: Arc<ServerAnswer>,
}

impl AppState {
    pub fn new(ingest: ServerIngest, answer: ServerAnswer) -> Self {
        Self {
            ingest: Arc::new(ingest),
            answer: Arc::new(answer),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn server_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload ============

#[derive(Debug)]
struct UploadedDocument {
    bytes: Vec<u8>,
    filename: String,
}

#[derive(Deserialize)]
struct UploadJson {
    file: Option<String>,
    filename: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    message: String,
    filename: String,
}

async fn handle_upload(State(state): State<AppState>, request: Request) -> Response {
    let upload = match read_upload(request).await {
        Ok(upload) => upload,
        Err(rejection) => return rejection.into_response(),
    };

    match state.ingest.ingest(&upload.bytes, &upload.filename).await {
        Ok(IngestOutcome::AlreadyIndexed) => {
            Json(serde_json::json!({ "message": MSG_ALREADY_INDEXED })).into_response()
        }
        Ok(IngestOutcome::NoExtractableText) => bad_request(MSG_NO_TEXT).into_response(),
        Ok(IngestOutcome::Indexed { chunk_count }) => {
            info!(filename = %upload.filename, chunk_count, "document indexed");
            Json(UploadResponse {
                success: true,
                message: MSG_INDEXED.to_string(),
                filename: upload.filename,
            })
            .into_response()
        }
        Err(err) => {
            error!(error = %err, filename = %upload.filename, "upload failed");
            server_error(format!("Error interno del servidor: {err}")).into_response()
        }
    }
}

/// Reads the uploaded document from either a `multipart/form-data` body with
/// a `file` part or a JSON body with a base64 `file` field.
async fn read_upload(request: Request) -> Result<UploadedDocument, AppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| bad_request(MSG_NO_FILE))?;
        read_multipart_upload(multipart).await
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_UPLOAD_BYTES)
            .await
            .map_err(|_| bad_request(MSG_NO_FILE))?;
        decode_json_upload(&bytes)
    }
}

async fn read_multipart_upload(mut multipart: Multipart) -> Result<UploadedDocument, AppError> {
    let mut file: Option<(Vec<u8>, String)> = None;
    let mut explicit_filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request(MSG_NO_FILE))?
    {
        let name = field.name().map(|name| name.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if let Some(message) = multipart_filename_error(&filename) {
                    return Err(bad_request(message));
                }
                let bytes = field.bytes().await.map_err(|_| bad_request(MSG_NO_FILE))?;
                file = Some((bytes.to_vec(), filename));
            }
            Some("filename") => {
                explicit_filename = field.text().await.ok();
            }
            _ => {}
        }
    }

    let (bytes, part_filename) = file.ok_or_else(|| bad_request(MSG_NO_FILE))?;
    Ok(UploadedDocument {
        bytes,
        filename: resolve_filename(explicit_filename, Some(part_filename)),
    })
}

fn decode_json_upload(body: &[u8]) -> Result<UploadedDocument, AppError> {
    let payload: UploadJson =
        serde_json::from_slice(body).map_err(|_| bad_request(MSG_NO_FILE))?;

    let encoded = payload.file.ok_or_else(|| bad_request(MSG_NO_FILE))?;
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|_| bad_request(MSG_INVALID_BASE64))?;

    Ok(UploadedDocument {
        bytes,
        filename: resolve_filename(payload.filename, None),
    })
}

fn multipart_filename_error(filename: &str) -> Option<&'static str> {
    if filename.is_empty() {
        Some(MSG_EMPTY_FILENAME)
    } else if !filename.to_lowercase().ends_with(".pdf") {
        Some(MSG_MUST_BE_PDF)
    } else {
        None
    }
}

fn resolve_filename(explicit: Option<String>, from_part: Option<String>) -> String {
    explicit
        .filter(|name| !name.trim().is_empty())
        .or(from_part)
        .unwrap_or_else(|| "unknown".to_string())
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    success: bool,
    answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens_used: Option<u32>,
}

async fn handle_ask(State(state): State<AppState>, request: Request) -> Response {
    let bytes = match axum::body::to_bytes(request.into_body(), MAX_UPLOAD_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return bad_request(MSG_QUESTION_REQUIRED).into_response(),
    };

    let question = match parse_question(&bytes) {
        Ok(question) => question,
        Err(rejection) => return rejection.into_response(),
    };

    match state.answer.answer(&question).await {
        Ok(outcome) => Json(AskResponse {
            success: true,
            answer: outcome.answer,
            tokens_used: outcome.tokens_used,
        })
        .into_response(),
        Err(err) => {
            error!(error = %err, "question failed");
            server_error(format!("Error al procesar la pregunta: {err}")).into_response()
        }
    }
}

fn parse_question(body: &[u8]) -> Result<String, AppError> {
    let payload: AskRequest =
        serde_json::from_slice(body).map_err(|_| bad_request(MSG_QUESTION_REQUIRED))?;

    payload
        .question
        .filter(|question| !question.trim().is_empty())
        .ok_or_else(|| bad_request(MSG_QUESTION_REQUIRED))
}
