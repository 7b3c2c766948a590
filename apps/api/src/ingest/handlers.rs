use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::ingest::pipeline::IngestSuccess;
use crate::models::resume::StructuredResume;
use crate::models::upload::RawUpload;
use crate::resume::parse_resume_text;
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub extraction: IngestSuccess,
    pub resume: StructuredResume,
}

/// POST /api/v1/resumes/ingest
///
/// Extracts plain text from an uploaded resume. Failures come back with the
/// diagnostics report attached.
pub async fn handle_ingest(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<IngestSuccess>, AppError> {
    let upload = read_upload(multipart).await?;
    let success = state
        .pipeline
        .run_with_deadline(&upload, state.config.extraction_timeout())
        .await?;
    Ok(Json(success))
}

/// POST /api/v1/resumes/import
///
/// Ingest and parse in one call.
pub async fn handle_import(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    let upload = read_upload(multipart).await?;
    let extraction = state
        .pipeline
        .run_with_deadline(&upload, state.config.extraction_timeout())
        .await?;
    let resume = parse_resume_text(&extraction.text);
    info!(
        sections = resume.sections.len(),
        has_email = resume.email.is_some(),
        "resume imported"
    );
    Ok(Json(ImportResponse { extraction, resume }))
}

/// Pulls the `file` field out of a multipart body. Other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<RawUpload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        let mut upload = RawUpload::new(bytes, filename);
        if let Some(mime) = mime_type {
            upload = upload.with_mime_type(mime);
        }
        return Ok(upload);
    }
    Err(AppError::Validation(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}
