use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::knowledge::KnowledgeError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The model answered, but not with the JSON the extraction prompt asked for.
    #[error("Unable to parse {what} from model output")]
    UnparsableExtraction {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Upstream fetch failed: {0}")]
    Upstream(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Knowledge store error: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps an LLM failure during an extraction step, keeping parse failures distinct.
    pub fn from_extraction(what: &'static str, err: LlmError) -> Self {
        match err {
            LlmError::Parse(source) => AppError::UnparsableExtraction { what, source },
            other => AppError::Llm(format!("{what} extraction failed: {other}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnparsableExtraction { source, .. } => {
                tracing::error!("{self}: {source}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNPARSABLE_EXTRACTION",
                    self.to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Knowledge(e) => {
                tracing::error!("Knowledge store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "KNOWLEDGE_ERROR",
                    e.to_string(),
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
