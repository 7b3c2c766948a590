use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::resume::StructuredResume;
use crate::resume::parse_resume_text;

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
}

/// POST /api/v1/resumes/parse
///
/// Structures already-extracted resume text. Never fails on content; an
/// empty body just yields an empty resume.
pub async fn handle_parse(
    Json(req): Json<ParseRequest>,
) -> Result<Json<StructuredResume>, AppError> {
    Ok(Json(parse_resume_text(&req.text)))
}
