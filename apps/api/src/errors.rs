use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::search::RetrievalError;
use crate::storage::blob::BlobError;
use crate::storage::terms::TermStoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed source document, job payload, or object key. Fatal to one item only.
    #[error("Invalid input format: {0}")]
    InputFormat(String),

    /// Search backend unreachable or query rejected. Never treated as "zero hits".
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Generation failed after {attempts} attempt(s): {reason}")]
    Generation { reason: String, attempts: u32 },

    #[error("Blob storage error: {0}")]
    Blob(#[from] BlobError),

    #[error("Terminology store error: {0}")]
    TermStore(#[from] TermStoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InputFormat(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INPUT_FORMAT_ERROR",
                msg.clone(),
            ),
            AppError::Retrieval(e) => {
                tracing::error!("Retrieval error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "RETRIEVAL_ERROR",
                    "The search backend is unavailable".to_string(),
                )
            }
            AppError::Generation { reason, attempts } => {
                tracing::error!("Generation error after {attempts} attempt(s): {reason}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_ERROR",
                    "The model call failed".to_string(),
                )
            }
            AppError::Blob(BlobError::NotFound(key)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Object {key} not found"),
            ),
            AppError::Blob(e) => {
                tracing::error!("Blob storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::TermStore(e) => {
                tracing::error!("Terminology store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
