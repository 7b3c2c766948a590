//! Diagnostics report assembled from signals the pipeline already computed.
//! Nothing here extracts or re-assesses text.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::ingest::extract::{ExtractionAttempt, ExtractionError, ExtractionOutcome, Strategy};
use crate::ingest::quality::{QualityAssessment, QualityIssue};
use crate::models::upload::{DetectedFormat, RawUpload};

#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<&'static str>,
    pub outcome: ExtractionOutcome,
    pub elapsed_ms: u64,
    pub chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityAssessment>,
}

impl From<&ExtractionAttempt> for AttemptSummary {
    fn from(a: &ExtractionAttempt) -> Self {
        Self {
            strategy: a.strategy,
            engine: a.engine,
            outcome: a.outcome,
            elapsed_ms: a.elapsed.as_millis() as u64,
            chars: a.char_count(),
            page_count: a.page_count,
            error_reason: a.error.as_ref().map(ExtractionError::reason),
            error: a.error.as_ref().map(ToString::to_string),
            quality: a.quality.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub filename: String,
    pub declared_mime_type: Option<String>,
    /// What the filename / MIME type claimed, if anything.
    pub declared_format: Option<DetectedFormat>,
    pub detected_format: DetectedFormat,
    pub attempts: Vec<AttemptSummary>,
    /// Strategy whose text was selected, if any produced text.
    pub selected_strategy: Option<Strategy>,
    pub quality: Option<QualityAssessment>,
    pub guidance: Vec<String>,
}

impl DiagnosticsReport {
    /// `selected` indexes into `attempts`.
    pub fn build(
        run_id: Uuid,
        upload: &RawUpload,
        detected_format: DetectedFormat,
        attempts: &[ExtractionAttempt],
        selected: Option<usize>,
    ) -> Self {
        let declared_format = upload.declared_format();
        let winner = selected.and_then(|i| attempts.get(i));
        let quality = winner.and_then(|a| a.quality.clone());

        let guidance = build_guidance(
            declared_format,
            detected_format,
            attempts,
            winner.map(|a| a.strategy),
            quality.as_ref(),
        );

        Self {
            run_id,
            generated_at: Utc::now(),
            filename: upload.filename.clone(),
            declared_mime_type: upload.mime_type.clone(),
            declared_format,
            detected_format,
            attempts: attempts.iter().map(AttemptSummary::from).collect(),
            selected_strategy: winner.map(|a| a.strategy),
            quality,
            guidance,
        }
    }

    pub fn declared_format_mismatch(&self) -> bool {
        matches!(self.declared_format, Some(d) if d != self.detected_format)
    }
}

/// Actionable, user-facing suggestions derived from the run's signals.
pub fn build_guidance(
    declared_format: Option<DetectedFormat>,
    detected_format: DetectedFormat,
    attempts: &[ExtractionAttempt],
    selected_strategy: Option<Strategy>,
    quality: Option<&QualityAssessment>,
) -> Vec<String> {
    let mut guidance = Vec::new();

    if detected_format == DetectedFormat::Unknown {
        guidance.push(
            "This file type isn't supported. Upload a PDF, a Word (.docx) document, or a \
            plain-text file."
                .to_string(),
        );
    }

    if let Some(declared) = declared_format {
        if declared != detected_format && detected_format != DetectedFormat::Unknown {
            guidance.push(format!(
                "The file was labelled as {declared} but its contents look like \
                {detected_format}. Check that it wasn't renamed from another format."
            ));
        }
    }

    let errors: Vec<&ExtractionError> = attempts.iter().filter_map(|a| a.error.as_ref()).collect();
    let all_failed = !attempts.is_empty() && errors.len() == attempts.len();

    if detected_format == DetectedFormat::Pdf
        && all_failed
        && errors.iter().any(|e| matches!(e, ExtractionError::NoTextLayer(_)))
    {
        guidance.push(
            "This PDF looks scanned or image-only. Export it again from the original editor with \
            selectable text, or upload the .docx version."
                .to_string(),
        );
    }
    if errors.iter().any(|e| matches!(e, ExtractionError::Corrupt(_))) && all_failed {
        guidance.push(
            "The file appears to be damaged. Open it, save or export a fresh copy, and upload \
            again."
                .to_string(),
        );
    }
    if errors.iter().any(|e| matches!(e, ExtractionError::Timeout(_))) {
        guidance.push(
            "Processing took too long. Try a smaller file or a plain-text export.".to_string(),
        );
    }

    if selected_strategy.is_some_and(|s| s.is_degraded()) {
        guidance.push(
            "The document couldn't be opened normally, so text was recovered by a raw scan and \
            may be incomplete or out of order."
                .to_string(),
        );
    }

    if let Some(q) = quality {
        if q.issues.contains(&QualityIssue::TooShort) {
            guidance.push(
                "Very little text could be read from this file. Make sure the resume text is \
                selectable, not an image."
                    .to_string(),
            );
        }
        if q.is_garbled() {
            guidance.push(
                "The extracted text contains unreadable characters. Try re-exporting as plain \
                text or as a standard PDF."
                    .to_string(),
            );
        }
        if !q.looks_like_resume {
            guidance.push(
                "The text doesn't look much like a resume. Double-check that you uploaded the \
                right file."
                    .to_string(),
            );
        }
    }

    if guidance.is_empty() && quality.map_or(true, |q| !q.is_usable()) {
        guidance.push("Try re-exporting the resume as plain text and uploading that.".to_string());
    }
    guidance
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extraction diagnostics for '{}' (run {})", self.filename, self.run_id)?;
        write!(f, "  detected format: {}", self.detected_format)?;
        if let Some(declared) = self.declared_format {
            write!(f, " (declared: {declared})")?;
        }
        writeln!(f)?;

        if self.attempts.is_empty() {
            writeln!(f, "  no extraction strategies were attempted")?;
        }
        for (i, a) in self.attempts.iter().enumerate() {
            write!(
                f,
                "  attempt {}: {} -> {:?}, {} chars in {}ms",
                i + 1,
                a.strategy,
                a.outcome,
                a.chars,
                a.elapsed_ms
            )?;
            if let Some(engine) = a.engine {
                write!(f, " [{engine}]")?;
            }
            if let Some(q) = &a.quality {
                write!(f, ", quality {}", q.tier.as_str())?;
            }
            if let Some(err) = &a.error {
                write!(f, ", error: {err}")?;
            }
            writeln!(f)?;
        }

        if let Some(q) = &self.quality {
            writeln!(
                f,
                "  selected quality: {} (garbled {:.1}%, {} words, resume terms: {})",
                q.tier.as_str(),
                q.garbled_ratio * 100.0,
                q.word_count,
                q.resume_keywords.len()
            )?;
            for issue in &q.issues {
                writeln!(f, "    - {}", issue.describe())?;
            }
        }

        if !self.guidance.is_empty() {
            writeln!(f, "  suggestions:")?;
            for g in &self.guidance {
                writeln!(f, "    * {g}")?;
            }
        }
        Ok(())
    }
}
