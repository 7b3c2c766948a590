//! Format-specific text extraction strategies.
//!
//! Each strategy is a function from raw bytes to text. Low-level failures
//! (corrupt containers, decoder errors, parser panics) are converted to
//! `ExtractionError` here and never escape further as anything else.

pub mod docx;
pub mod pdf;
pub mod text;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::quality::QualityAssessment;
use crate::models::upload::DetectedFormat;

/// Below this many trimmed characters an extraction counts as partial.
pub const MIN_VIABLE_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no text layer: {0}")]
    NoTextLayer(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),

    #[error("extraction timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ExtractionError {
    /// Stable machine-readable reason, as reported in diagnostics.
    pub fn reason(&self) -> &'static str {
        match self {
            ExtractionError::NoTextLayer(_) => "no-text-layer",
            ExtractionError::Corrupt(_) => "corrupt",
            ExtractionError::Timeout(_) => "timeout",
        }
    }
}

/// One way of turning bytes into text. Chains of these are tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Text layer via the primary PDF engine.
    PdfTextLayer,
    /// Text layer via the fallback PDF engine.
    PdfFallbackTextLayer,
    /// `word/document.xml` with tags stripped.
    DocxXml,
    /// Printable ASCII runs scanned out of the raw container bytes.
    DocxBinaryScan,
    PlainText,
}

const PDF_CHAIN: &[Strategy] = &[Strategy::PdfTextLayer, Strategy::PdfFallbackTextLayer];
const DOCX_CHAIN: &[Strategy] = &[Strategy::DocxXml, Strategy::DocxBinaryScan];
const TXT_CHAIN: &[Strategy] = &[Strategy::PlainText];

impl Strategy {
    /// Ordered strategy chain for a detected format. Empty for `Unknown`.
    pub fn chain_for(format: DetectedFormat) -> &'static [Strategy] {
        match format {
            DetectedFormat::Pdf => PDF_CHAIN,
            DetectedFormat::Docx => DOCX_CHAIN,
            DetectedFormat::Txt => TXT_CHAIN,
            DetectedFormat::Unknown => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::PdfTextLayer => "pdf-text-layer",
            Strategy::PdfFallbackTextLayer => "pdf-fallback-text-layer",
            Strategy::DocxXml => "docx-xml",
            Strategy::DocxBinaryScan => "docx-binary-scan",
            Strategy::PlainText => "plain-text",
        }
    }

    /// Lossy strategies recover text without structure and say so in guidance.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Strategy::DocxBinaryScan)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionOutcome {
    Success,
    /// Text came back but below `MIN_VIABLE_CHARS`.
    Partial,
    Failed,
}

impl ExtractionOutcome {
    pub fn for_text(text: &str) -> Self {
        let len = text.trim().chars().count();
        if len == 0 {
            ExtractionOutcome::Failed
        } else if len < MIN_VIABLE_CHARS {
            ExtractionOutcome::Partial
        } else {
            ExtractionOutcome::Success
        }
    }
}

/// Record of a single strategy invocation. Kept for the length of one
/// pipeline run so diagnostics can report every step taken.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub strategy: Strategy,
    /// PDF engine that served the attempt, when the strategy uses one.
    pub engine: Option<&'static str>,
    pub text: String,
    pub elapsed: Duration,
    pub outcome: ExtractionOutcome,
    pub error: Option<ExtractionError>,
    pub page_count: Option<usize>,
    /// Present whenever the strategy produced any text.
    pub quality: Option<QualityAssessment>,
}

impl ExtractionAttempt {
    pub fn failed(strategy: Strategy, error: ExtractionError, elapsed: Duration) -> Self {
        Self {
            strategy,
            engine: None,
            text: String::new(),
            elapsed,
            outcome: ExtractionOutcome::Failed,
            error: Some(error),
            page_count: None,
            quality: None,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Text produced by a strategy along with what it learned about the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: Option<usize>,
}

impl From<String> for ExtractedText {
    fn from(text: String) -> Self {
        Self {
            text,
            page_count: None,
        }
    }
}
