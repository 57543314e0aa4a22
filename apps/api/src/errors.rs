use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ai_client::AiError;
use crate::analysis::flow::{FlowError, FlowStage};
use crate::document::ExtractionError;
use crate::export::ExportError;
use crate::session::SessionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested export has no result behind it yet.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::NotFound(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut stage: Option<FlowStage> = None;
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "NOTHING_TO_EXPORT", msg.clone()),
            AppError::Flow(e) => {
                stage = Some(e.stage());
                let (status, code) = flow_status(e);
                (status, code, e.to_string())
            }
            AppError::Multipart(e) => (e.status(), "MALFORMED_UPLOAD", e.body_text()),
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    "The export could not be generated".to_string(),
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

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(stage) = stage {
            error["stage"] = json!(stage);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

fn flow_status(error: &FlowError) -> (StatusCode, &'static str) {
    match error {
        FlowError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        FlowError::Extraction(ExtractionError::NotPdf { .. }) => {
            (StatusCode::UNSUPPORTED_MEDIA_TYPE, "NOT_A_PDF")
        }
        FlowError::Extraction(ExtractionError::Empty { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_DOCUMENT")
        }
        FlowError::Extraction(ExtractionError::Corrupt { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "UNREADABLE_PDF")
        }
        FlowError::Ai(AiError::Auth(msg)) => {
            tracing::error!("AI credentials rejected: {msg}");
            (StatusCode::BAD_GATEWAY, "AI_AUTH_ERROR")
        }
        FlowError::Ai(AiError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, "AI_TIMEOUT"),
        FlowError::Ai(AiError::Service(_)) => (StatusCode::SERVICE_UNAVAILABLE, "AI_SERVICE_ERROR"),
    }
}
