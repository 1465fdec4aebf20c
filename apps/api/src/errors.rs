use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        FromRequest,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::agents::assessment::AssessmentError;
use crate::applications::extract::ExtractError;
use crate::jobs::file_store::StoreError;
use crate::llm_client::LlmError;
use crate::orchestrator::outputs::OutputStoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Model answered, but not with the JSON we asked for.
    #[error("{message}")]
    ModelOutput {
        message: String,
        raw_output: Option<String>,
    },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("File store error: {0}")]
    Store(#[from] StoreError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Output store error: {0}")]
    OutputStore(#[from] OutputStoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AssessmentError> for AppError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::Gateway(e) => AppError::Llm(e),
            AssessmentError::Output(failure) => AppError::ModelOutput {
                message: failure.error,
                raw_output: failure.raw_output,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut raw_output = None;
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::ModelOutput {
                message,
                raw_output: raw,
            } => {
                tracing::warn!("Unusable model output: {message}");
                raw_output = raw;
                (StatusCode::INTERNAL_SERVER_ERROR, "MODEL_OUTPUT_ERROR", message)
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "LLM_ERROR", e.to_string())
            }
            AppError::Store(StoreError::Conflict { path }) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("{path} changed since it was read; reload and try again"),
            ),
            AppError::Store(e) => {
                tracing::error!("File store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", e.to_string())
            }
            AppError::Extraction(ExtractError::Unsupported(ext)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Unsupported file type: {ext}"),
            ),
            AppError::Extraction(e) => {
                tracing::error!("Extraction error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "EXTRACTION_ERROR", e.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", e.to_string())
            }
            AppError::OutputStore(e) => {
                tracing::error!("Output store error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "OUTPUT_STORE_ERROR", e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.to_string())
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(raw) = raw_output {
            error["raw_output"] = json!(raw);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
/// Bad bodies are the caller's fault: a 400 with the usual error body,
/// not axum's plain-text 415/422.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// `axum::Json` for request bodies, rejecting through `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
