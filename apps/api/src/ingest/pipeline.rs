//! Ingestion orchestrator: sniff, run the strategy chain, assess, accept or
//! reject.
//!
//! A pipeline value holds only immutable engine handles, so one instance is
//! shared by every request. Each `run` owns its own attempts and report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::ingest::diagnostics::DiagnosticsReport;
use crate::ingest::extract::docx::{extract_docx_binary_scan, extract_docx_structured};
use crate::ingest::extract::pdf::{extract_pdf_text, PdfEngine, PdfEngineKind};
use crate::ingest::extract::text::decode_plain_text;
use crate::ingest::extract::{
    ExtractedText, ExtractionAttempt, ExtractionError, ExtractionOutcome, Strategy,
};
use crate::ingest::quality::{assess_quality, QualityAssessment, QualityTier};
use crate::ingest::sniffer::detect_format;
use crate::models::upload::{DetectedFormat, RawUpload};

// ────────────────────────────────────────────────────────────────────────────
// Boundary types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct IngestMetadata {
    pub detected_format: DetectedFormat,
    pub extraction_strategy_used: Strategy,
    pub quality_tier: QualityTier,
    pub processing_time_ms: u64,
    pub looks_like_resume: bool,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestSuccess {
    pub text: String,
    pub metadata: IngestMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCode {
    UnsupportedFormat,
    ExtractionFailed,
    QualityTooLow,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::UnsupportedFormat => "unsupported-format",
            FailureCode::ExtractionFailed => "extraction-failed",
            FailureCode::QualityTooLow => "quality-too-low",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only error that crosses the ingestion boundary.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct IngestFailure {
    pub code: FailureCode,
    pub message: String,
    pub diagnostics: DiagnosticsReport,
    /// Best-effort text, present on `quality-too-low` so the caller may
    /// still use it with a warning.
    pub partial_text: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct IngestPipeline {
    primary_pdf: Arc<dyn PdfEngine>,
    fallback_pdf: Arc<dyn PdfEngine>,
}

impl IngestPipeline {
    pub fn new(primary_pdf: Arc<dyn PdfEngine>, fallback_pdf: Arc<dyn PdfEngine>) -> Self {
        Self {
            primary_pdf,
            fallback_pdf,
        }
    }

    pub fn with_engines(kind: PdfEngineKind) -> Self {
        let (primary, fallback) = kind.engines();
        Self::new(primary, fallback)
    }

    /// Runs one upload through sniffing, extraction and quality gating.
    pub async fn run(&self, upload: &RawUpload) -> Result<IngestSuccess, IngestFailure> {
        let run_id = Uuid::new_v4();
        let span = info_span!("ingest", %run_id, filename = %upload.filename);
        self.run_inner(run_id, upload).instrument(span).await
    }

    /// `run` bounded by `deadline`. Expiry is reported as `extraction-failed`
    /// with a timeout attempt in the diagnostics.
    pub async fn run_with_deadline(
        &self,
        upload: &RawUpload,
        deadline: Duration,
    ) -> Result<IngestSuccess, IngestFailure> {
        match tokio::time::timeout(deadline, self.run(upload)).await {
            Ok(result) => result,
            Err(_) => {
                let detected = detect_format(&upload.bytes);
                warn!(filename = %upload.filename, ?deadline, "ingestion timed out");
                let attempt = ExtractionAttempt::failed(
                    Strategy::chain_for(detected)
                        .first()
                        .copied()
                        .unwrap_or(Strategy::PlainText),
                    ExtractionError::Timeout(deadline),
                    deadline,
                );
                let diagnostics =
                    DiagnosticsReport::build(Uuid::new_v4(), upload, detected, &[attempt], None);
                Err(IngestFailure {
                    code: FailureCode::ExtractionFailed,
                    message: format!(
                        "Extraction did not finish within {}s",
                        deadline.as_secs_f32()
                    ),
                    diagnostics,
                    partial_text: None,
                })
            }
        }
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        upload: &RawUpload,
    ) -> Result<IngestSuccess, IngestFailure> {
        let started = Instant::now();
        let detected = detect_format(&upload.bytes);

        info!(
            detected = %detected,
            declared = ?upload.declared_format(),
            bytes = upload.bytes.len(),
            "format detected"
        );

        if detected == DetectedFormat::Unknown {
            let diagnostics = DiagnosticsReport::build(run_id, upload, detected, &[], None);
            return Err(IngestFailure {
                code: FailureCode::UnsupportedFormat,
                message: "File is not a PDF, DOCX or plain-text document".to_string(),
                diagnostics,
                partial_text: None,
            });
        }

        let mut attempts: Vec<ExtractionAttempt> = Vec::new();
        for &strategy in Strategy::chain_for(detected) {
            // A lossy scan reads the same container with less fidelity, so it
            // only stands in when nothing earlier produced text at all.
            if strategy.is_degraded() && attempts.iter().any(|a| a.quality.is_some()) {
                debug!(strategy = %strategy, "skipping degraded strategy");
                continue;
            }
            let attempt = self.attempt(strategy, upload.bytes.clone()).await;
            let accepted = attempt.quality.as_ref().is_some_and(|q| q.is_usable());
            attempts.push(attempt);
            if accepted {
                break;
            }
        }

        let Some((best, quality)) = select_best(&attempts) else {
            let diagnostics = DiagnosticsReport::build(run_id, upload, detected, &attempts, None);
            warn!("every extraction strategy failed");
            return Err(IngestFailure {
                code: FailureCode::ExtractionFailed,
                message: format!("No text could be extracted from this {detected} file"),
                diagnostics,
                partial_text: None,
            });
        };

        let winner = &attempts[best];
        let quality = quality.clone();

        if !quality.is_usable() {
            let diagnostics =
                DiagnosticsReport::build(run_id, upload, detected, &attempts, Some(best));
            warn!(strategy = %winner.strategy, "best candidate is still poor quality");
            return Err(IngestFailure {
                code: FailureCode::QualityTooLow,
                message: "The extracted text is too short or unreadable to use reliably"
                    .to_string(),
                diagnostics,
                partial_text: Some(winner.text.clone()),
            });
        }

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            strategy = %winner.strategy,
            tier = quality.tier.as_str(),
            processing_time_ms,
            "extraction accepted"
        );

        Ok(IngestSuccess {
            text: winner.text.clone(),
            metadata: IngestMetadata {
                detected_format: detected,
                extraction_strategy_used: winner.strategy,
                quality_tier: quality.tier,
                processing_time_ms,
                looks_like_resume: quality.looks_like_resume,
                word_count: quality.word_count,
            },
        })
    }

    /// Runs one strategy. Errors become a failed attempt, never a panic or
    /// an early return.
    async fn attempt(&self, strategy: Strategy, bytes: Bytes) -> ExtractionAttempt {
        let started = Instant::now();
        let engine = match strategy {
            Strategy::PdfTextLayer => Some(self.primary_pdf.name()),
            Strategy::PdfFallbackTextLayer => Some(self.fallback_pdf.name()),
            _ => None,
        };

        let result = self.extract(strategy, bytes).await;
        let elapsed = started.elapsed();

        let attempt = match result {
            Ok(extracted) if !extracted.text.trim().is_empty() => {
                let quality = assess_quality(&extracted.text);
                ExtractionAttempt {
                    strategy,
                    engine,
                    outcome: ExtractionOutcome::for_text(&extracted.text),
                    text: extracted.text,
                    elapsed,
                    error: None,
                    page_count: extracted.page_count,
                    quality: Some(quality),
                }
            }
            Ok(extracted) => ExtractionAttempt {
                engine,
                page_count: extracted.page_count,
                ..ExtractionAttempt::failed(
                    strategy,
                    ExtractionError::NoTextLayer("strategy produced no text".to_string()),
                    elapsed,
                )
            },
            Err(e) => ExtractionAttempt {
                engine,
                ..ExtractionAttempt::failed(strategy, e, elapsed)
            },
        };

        debug!(
            strategy = %attempt.strategy,
            outcome = ?attempt.outcome,
            chars = attempt.char_count(),
            elapsed_ms = attempt.elapsed.as_millis() as u64,
            tier = attempt.quality.as_ref().map(|q| q.tier.as_str()),
            error = attempt.error.as_ref().map(|e| e.to_string()),
            "extraction attempt finished"
        );
        attempt
    }

    async fn extract(
        &self,
        strategy: Strategy,
        bytes: Bytes,
    ) -> Result<ExtractedText, ExtractionError> {
        match strategy {
            Strategy::PdfTextLayer => extract_pdf_text(self.primary_pdf.as_ref(), bytes).await,
            Strategy::PdfFallbackTextLayer => {
                extract_pdf_text(self.fallback_pdf.as_ref(), bytes).await
            }
            Strategy::DocxXml => extract_docx_structured(&bytes).map(ExtractedText::from),
            Strategy::DocxBinaryScan => extract_docx_binary_scan(&bytes).map(ExtractedText::from),
            Strategy::PlainText => decode_plain_text(&bytes).map(|(text, encoding)| {
                debug!(?encoding, "plain text decoded");
                ExtractedText::from(text)
            }),
        }
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::with_engines(PdfEngineKind::default())
    }
}

/// Highest-ranked attempt that produced text, with its assessment.
/// Earlier attempts win ties.
fn select_best(attempts: &[ExtractionAttempt]) -> Option<(usize, &QualityAssessment)> {
    let mut best: Option<(usize, &QualityAssessment)> = None;
    for (i, attempt) in attempts.iter().enumerate() {
        let Some(q) = &attempt.quality else { continue };
        match best {
            Some((_, current)) if !q.compare(current).is_gt() => {}
            _ => best = Some((i, q)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::extract::docx::tests::{docx_with_body, zip_with_parts};
    use crate::ingest::extract::pdf::tests::FakeEngine;
    use crate::ingest::extract::pdf::PageText;
    use async_trait::async_trait;

    const RESUME_TEXT: &str = "Jane Doe\n\
        jane.doe@example.com | (415) 555-1234\n\
        SUMMARY\n\
        Platform engineer with a decade of experience in distributed systems.\n\
        EXPERIENCE\n\
        Acme Corp - Staff Engineer\n\
        EDUCATION\n\
        BSc Computer Science, State University\n\
        SKILLS\n\
        Rust, Go, Kubernetes\n";

    fn pipeline_with(primary: FakeEngine, fallback: FakeEngine) -> IngestPipeline {
        IngestPipeline::new(Arc::new(primary), Arc::new(fallback))
    }

    fn unused_engines() -> IngestPipeline {
        pipeline_with(
            FakeEngine::failing(ExtractionError::Corrupt("unused".into())),
            FakeEngine::failing(ExtractionError::Corrupt("unused".into())),
        )
    }

    #[tokio::test]
    async fn test_plain_text_upload_succeeds() {
        let upload = RawUpload::new(RESUME_TEXT.as_bytes().to_vec(), "resume.txt");
        let success = unused_engines().run(&upload).await.unwrap();
        assert_eq!(success.metadata.detected_format, DetectedFormat::Txt);
        assert_eq!(success.metadata.extraction_strategy_used, Strategy::PlainText);
        assert_eq!(success.metadata.quality_tier, QualityTier::Good);
        assert!(success.metadata.looks_like_resume);
        assert!(success.text.starts_with("Jane Doe"));
    }

    #[tokio::test]
    async fn test_unknown_format_is_unsupported() {
        let bytes: Vec<u8> = (0u8..16).cycle().take(128).collect();
        let upload = RawUpload::new(bytes, "resume.pdf").with_mime_type("application/pdf");
        let failure = unused_engines().run(&upload).await.unwrap_err();
        assert_eq!(failure.code, FailureCode::UnsupportedFormat);
        assert!(failure.diagnostics.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_pdf_primary_engine_accepted_without_fallback() {
        let pipeline = pipeline_with(
            FakeEngine::pages(vec![PageText::from_runs([RESUME_TEXT])]),
            FakeEngine::failing(ExtractionError::Corrupt("should not run".into())),
        );
        let upload = RawUpload::new(b"%PDF-1.7 fake".to_vec(), "resume.pdf");
        let success = pipeline.run(&upload).await.unwrap();
        assert_eq!(success.metadata.extraction_strategy_used, Strategy::PdfTextLayer);
    }

    #[tokio::test]
    async fn test_pdf_falls_back_when_primary_fails() {
        let pipeline = pipeline_with(
            FakeEngine::failing(ExtractionError::Corrupt("font table".into())),
            FakeEngine::pages(vec![PageText::from_runs([RESUME_TEXT])]),
        );
        let upload = RawUpload::new(b"%PDF-1.7 fake".to_vec(), "resume.pdf");
        let success = pipeline.run(&upload).await.unwrap();
        assert_eq!(
            success.metadata.extraction_strategy_used,
            Strategy::PdfFallbackTextLayer
        );
    }

    #[tokio::test]
    async fn test_pdf_without_text_layer_is_extraction_failed() {
        let pipeline = pipeline_with(
            FakeEngine::pages(vec![PageText::default()]),
            FakeEngine::pages(vec![PageText::default()]),
        );
        let upload = RawUpload::new(b"%PDF-1.7 scanned".to_vec(), "scan.pdf");
        let failure = pipeline.run(&upload).await.unwrap_err();
        assert_eq!(failure.code, FailureCode::ExtractionFailed);
        assert_eq!(failure.diagnostics.attempts.len(), 2);
        assert!(failure.partial_text.is_none());
        assert!(failure
            .diagnostics
            .attempts
            .iter()
            .all(|a| a.error_reason == Some("no-text-layer")));
    }

    #[tokio::test]
    async fn test_short_pdf_text_is_quality_too_low_with_partial_text() {
        let pipeline = pipeline_with(
            FakeEngine::pages(vec![PageText::from_runs(["Jane Doe"])]),
            FakeEngine::pages(vec![PageText::from_runs(["Jane"])]),
        );
        let upload = RawUpload::new(b"%PDF-1.7 fake".to_vec(), "resume.pdf");
        let failure = pipeline.run(&upload).await.unwrap_err();
        assert_eq!(failure.code, FailureCode::QualityTooLow);
        assert_eq!(failure.partial_text.as_deref(), Some("Jane Doe"));
        assert_eq!(failure.diagnostics.selected_strategy, Some(Strategy::PdfTextLayer));
        assert_eq!(
            failure.diagnostics.attempts[0].outcome,
            ExtractionOutcome::Partial
        );
    }

    #[tokio::test]
    async fn test_docx_end_to_end_structured() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>SKILLS</w:t></w:r><w:r><w:t>Python, Go, Rust</w:t></w:r></w:p>",
        );
        let upload = RawUpload::new(bytes, "resume.docx");
        // Two runs are too short to pass the gate; the text still comes back
        // and the lossy scan is not consulted since the XML read worked.
        let failure = unused_engines().run(&upload).await.unwrap_err();
        assert_eq!(failure.code, FailureCode::QualityTooLow);
        assert_eq!(failure.diagnostics.attempts.len(), 1);
        let text = failure.partial_text.unwrap();
        assert!(text.contains("SKILLS Python, Go, Rust"));
        assert_eq!(failure.diagnostics.selected_strategy, Some(Strategy::DocxXml));
    }

    #[tokio::test]
    async fn test_docx_full_document_accepted() {
        let paragraphs: String = RESUME_TEXT
            .lines()
            .map(|l| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", l.replace('&', "&amp;")))
            .collect();
        let upload = RawUpload::new(docx_with_body(&paragraphs), "resume.docx");
        let success = unused_engines().run(&upload).await.unwrap();
        assert_eq!(success.metadata.extraction_strategy_used, Strategy::DocxXml);
        assert!(success.text.contains("EXPERIENCE Acme Corp - Staff Engineer"));
    }

    #[tokio::test]
    async fn test_docx_without_document_part_uses_binary_scan() {
        let bytes = zip_with_parts(&[("notes/resume.txt", RESUME_TEXT)]);
        let upload = RawUpload::new(bytes, "resume.docx");
        let success = unused_engines().run(&upload).await.unwrap();
        assert_eq!(
            success.metadata.extraction_strategy_used,
            Strategy::DocxBinaryScan
        );
        assert!(success.text.contains("Acme Corp - Staff Engineer"));
    }

    #[tokio::test]
    async fn test_extension_is_ignored() {
        let upload = RawUpload::new(RESUME_TEXT.as_bytes().to_vec(), "resume.pdf")
            .with_mime_type("application/pdf");
        let success = unused_engines().run(&upload).await.unwrap();
        assert_eq!(success.metadata.detected_format, DetectedFormat::Txt);
    }

    #[test]
    fn test_select_best_prefers_higher_tier() {
        let poor = ExtractionAttempt {
            strategy: Strategy::DocxXml,
            engine: None,
            text: "tiny".into(),
            elapsed: Duration::ZERO,
            outcome: ExtractionOutcome::Partial,
            error: None,
            page_count: None,
            quality: Some(assess_quality("tiny")),
        };
        let good = ExtractionAttempt {
            strategy: Strategy::DocxBinaryScan,
            text: RESUME_TEXT.into(),
            quality: Some(assess_quality(RESUME_TEXT)),
            outcome: ExtractionOutcome::Success,
            ..poor.clone()
        };
        assert_eq!(select_best(&[poor.clone(), good]).map(|(i, _)| i), Some(1));
        assert_eq!(select_best(&[poor.clone(), poor]).map(|(i, _)| i), Some(0));
        assert!(select_best(&[]).is_none());
    }

    struct StallingEngine;

    #[async_trait]
    impl PdfEngine for StallingEngine {
        fn name(&self) -> &'static str {
            "stalling"
        }

        async fn page_texts(&self, _bytes: Bytes) -> Result<Vec<PageText>, ExtractionError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_extraction_failed_timeout() {
        let pipeline = IngestPipeline::new(Arc::new(StallingEngine), Arc::new(StallingEngine));
        let upload = RawUpload::new(b"%PDF-1.7 slow".to_vec(), "slow.pdf");
        let failure = pipeline
            .run_with_deadline(&upload, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(failure.code, FailureCode::ExtractionFailed);
        assert_eq!(failure.diagnostics.attempts[0].error_reason, Some("timeout"));
        assert!(failure
            .diagnostics
            .guidance
            .iter()
            .any(|g| g.contains("took too long")));
    }
}
