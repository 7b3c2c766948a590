use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::pipeline::{FailureCode, IngestFailure};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Ingestion failed: {0}")]
    Ingest(#[from] Box<IngestFailure>),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<IngestFailure> for AppError {
    fn from(failure: IngestFailure) -> Self {
        AppError::Ingest(Box::new(failure))
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Validation(e.body_text())
        }
    }
}

fn ingest_status(code: FailureCode) -> StatusCode {
    match code {
        FailureCode::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        FailureCode::ExtractionFailed | FailureCode::QualityTooLow => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            AppError::Ingest(failure) => {
                tracing::warn!(
                    code = failure.code.as_str(),
                    filename = %failure.diagnostics.filename,
                    "ingestion failed: {}",
                    failure.message
                );
                let body = Json(json!({
                    "error": {
                        "code": failure.code,
                        "message": failure.message,
                        "diagnostics_report": failure.diagnostics,
                        "diagnostics_summary": failure.diagnostics.to_string(),
                        "partial_text": failure.partial_text,
                    }
                }));
                return (ingest_status(failure.code), body).into_response();
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
