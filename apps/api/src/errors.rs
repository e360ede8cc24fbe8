use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::photos::artifacts::StoreError;
use crate::photos::orchestrator::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM is not configured")]
    LlmUnconfigured,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::LlmUnconfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "LLM_UNCONFIGURED",
                "ANTHROPIC_API_KEY not configured. Please add it to your environment variables."
                    .to_string(),
            ),
            AppError::Llm(e @ (LlmError::Parse(_) | LlmError::Schema(_) | LlmError::EmptyContent)) => {
                tracing::error!("LLM response error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_RESPONSE_INVALID",
                    "Failed to parse AI response. Please try again.".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                let detail = match e {
                    LlmError::Api { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    format!("AI service error: {detail}"),
                )
            }
            AppError::Generation(e) => generation_parts(e),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
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
        }
    }
}

fn generation_parts(e: &GenerationError) -> (StatusCode, &'static str, String) {
    match e {
        GenerationError::ProviderUnreachable(_) => {
            (StatusCode::BAD_GATEWAY, "PROVIDER_UNREACHABLE", e.to_string())
        }
        GenerationError::ProviderRejected { .. } => {
            (StatusCode::BAD_GATEWAY, "PROVIDER_REJECTED", e.to_string())
        }
        GenerationError::ProviderFailed(_) => {
            (StatusCode::BAD_GATEWAY, "PROVIDER_FAILED", e.to_string())
        }
        GenerationError::ProviderResponseInvalid(_) => {
            tracing::error!("{e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PROVIDER_RESPONSE_INVALID",
                "The image service returned an unexpected response. Please try again.".to_string(),
            )
        }
        GenerationError::PollTimeout { .. } => {
            (StatusCode::GATEWAY_TIMEOUT, "GENERATION_TIMEOUT", e.to_string())
        }
        GenerationError::SourceUnavailable(_) => {
            tracing::error!("{e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SOURCE_UNAVAILABLE",
                "Failed to get image URL".to_string(),
            )
        }
        GenerationError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            "GENERATION_CANCELLED",
            "Generation was cancelled because the server is shutting down".to_string(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
