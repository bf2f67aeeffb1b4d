//! HTTP upload endpoint: document in, quiz JSON out.

use anyhow::Result;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::extract::{self, ExtractError, ExtractOptions, OCTET_STREAM_MIME, SourceDocument};
use crate::llm::JsonCompletion;
use crate::quiz::{self, QuizItem, QuizMode, QuizOptions};

const INSUFFICIENT_TEXT_MESSAGE: &str =
    "Text extraction failed (too little text or image-only without OCR).";

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn JsonCompletion>,
    pub extract_options: ExtractOptions,
}

#[derive(Serialize)]
pub struct QuizResponse {
    pub quiz: Vec<QuizItem>,
    #[serde(rename = "type")]
    pub mode: QuizMode,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        match &self {
            ExtractError::UnsupportedFormat(_) | ExtractError::CorruptInput { .. } => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            ExtractError::OversizeInput { .. } => {
                error_response(StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            ExtractError::InsufficientText { .. } => {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, INSUFFICIENT_TEXT_MESSAGE)
            }
            ExtractError::Io(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Room for the largest accepted PDF plus the other form fields
    let body_limit = state.extract_options.max_pdf_bytes + 1024 * 1024;

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate-quiz", post(generate_quiz_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let router = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fields collected from the multipart upload
#[derive(Default)]
struct UploadForm {
    file: Option<SourceDocument>,
    question_count: Option<String>,
    difficulty: Option<String>,
    mode: Option<String>,
}

/// A multipart read failure, with the status it should be answered with
struct UploadError {
    status: StatusCode,
    message: String,
}

impl UploadError {
    /// Body-limit failures answer 413 with the upload ceiling
    fn from_multipart(e: MultipartError, context: &str, max_pdf_bytes: usize) -> Self {
        let status = e.status();
        let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
            format!("Upload exceeds the {max_pdf_bytes} byte limit")
        } else {
            format!("{context}: {}", e.body_text())
        };
        Self { status, message }
    }
}

async fn read_form(
    multipart: &mut Multipart,
    max_pdf_bytes: usize,
) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();
    let reject = |context: &'static str| {
        move |e: MultipartError| UploadError::from_multipart(e, context, max_pdf_bytes)
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(reject("Failed to read multipart"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let media_type = field.content_type().unwrap_or(OCTET_STREAM_MIME).to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(reject("Failed to read file"))?;
                form.file = Some(SourceDocument::new(bytes.to_vec(), media_type, filename));
            }
            "questionCount" | "difficulty" | "mode" => {
                let value = field
                    .text()
                    .await
                    .map_err(reject("Failed to read form field"))?;
                match name.as_str() {
                    "questionCount" => form.question_count = Some(value),
                    "difficulty" => form.difficulty = Some(value),
                    _ => form.mode = Some(value),
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

#[tracing::instrument(skip(state, multipart))]
pub async fn generate_quiz_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_form(&mut multipart, state.extract_options.max_pdf_bytes).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(status = %e.status, error = %e.message, "Rejected upload");
            return error_response(e.status, e.message);
        }
    };

    let Some(document) = form.file else {
        tracing::warn!("Quiz request with no file");
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded.");
    };

    let options = QuizOptions::from_form(
        form.question_count.as_deref(),
        form.difficulty.as_deref(),
        form.mode.as_deref(),
    );

    tracing::debug!(
        filename = %document.filename,
        media_type = %document.media_type,
        bytes = document.bytes.len(),
        "Processing upload"
    );

    let text = match extract::extract_text_async(document, state.extract_options).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Extraction failed");
            return e.into_response();
        }
    };

    match quiz::generate(state.model.as_ref(), &text, &options).await {
        Ok(quiz) => Json(QuizResponse {
            quiz: quiz.items,
            mode: quiz.mode,
        })
        .into_response(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Quiz generation failed");
            error_response(StatusCode::BAD_GATEWAY, format!("{e:#}"))
        }
    }
}
