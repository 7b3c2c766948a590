//! PDF text-layer extraction.
//!
//! Page text comes from a `PdfEngine` injected by the caller, so the
//! page-joining and viability rules here are testable without a real parser.
//! Two engines ship: `PdfExtractEngine` (pdf-extract) and `LopdfEngine`
//! (lopdf content-stream text operators). No OCR; image-only pages yield
//! nothing.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{ExtractedText, ExtractionError};

/// Text runs of one page, in the order the engine reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pub runs: Vec<String>,
}

impl PageText {
    pub fn from_runs<I, S>(runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            runs: runs.into_iter().map(Into::into).collect(),
        }
    }

    /// Runs joined by single spaces. Empty runs are skipped.
    pub fn joined(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A PDF text-layer reader. Implement this to swap parsers without touching
/// the pipeline. Carried as `Arc<dyn PdfEngine>`.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns one entry per page, pages 1..N in order.
    async fn page_texts(&self, bytes: Bytes) -> Result<Vec<PageText>, ExtractionError>;
}

/// Reads every page through `engine` and joins pages with a blank line.
///
/// Fails with `NoTextLayer` only when no page yields any text. Short output
/// is returned as-is; deciding whether it is usable is the quality
/// analyzer's job.
pub async fn extract_pdf_text(
    engine: &dyn PdfEngine,
    bytes: Bytes,
) -> Result<ExtractedText, ExtractionError> {
    let pages = engine.page_texts(bytes).await?;
    let page_count = pages.len();

    let page_bodies: Vec<String> = pages
        .iter()
        .map(PageText::joined)
        .filter(|p| !p.is_empty())
        .collect();

    debug!(
        engine = engine.name(),
        page_count,
        pages_with_text = page_bodies.len(),
        "PDF pages read"
    );

    if page_bodies.is_empty() {
        return Err(ExtractionError::NoTextLayer(format!(
            "none of {page_count} page(s) has a text layer"
        )));
    }

    Ok(ExtractedText {
        text: page_bodies.join("\n\n"),
        page_count: Some(page_count),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Engines
// ────────────────────────────────────────────────────────────────────────────

/// Primary engine backed by the `pdf-extract` crate.
///
/// Each page is reported as a single run with its line structure kept, so
/// downstream line-based parsing still sees one resume line per text line.
pub struct PdfExtractEngine;

#[async_trait]
impl PdfEngine for PdfExtractEngine {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    async fn page_texts(&self, bytes: Bytes) -> Result<Vec<PageText>, ExtractionError> {
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| ExtractionError::Corrupt(format!("pdf-extract aborted: {e}")))?
        .map_err(|e| ExtractionError::Corrupt(e.to_string()))?;

        Ok(pages
            .into_iter()
            .map(|page| PageText::from_runs([tidy_page(&page)]))
            .collect())
    }
}

/// Fallback engine backed by `lopdf`'s text-operator extraction.
pub struct LopdfEngine;

#[async_trait]
impl PdfEngine for LopdfEngine {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    async fn page_texts(&self, bytes: Bytes) -> Result<Vec<PageText>, ExtractionError> {
        tokio::task::spawn_blocking(move || {
            let doc = lopdf::Document::load_mem(&bytes)
                .map_err(|e| ExtractionError::Corrupt(e.to_string()))?;

            let pages = doc
                .get_pages()
                .keys()
                .map(|&number| match doc.extract_text(&[number]) {
                    Ok(text) => PageText::from_runs([tidy_page(&text)]),
                    Err(e) => {
                        debug!(page = number, "lopdf could not read page text: {e}");
                        PageText::default()
                    }
                })
                .collect();
            Ok(pages)
        })
        .await
        .map_err(|e| ExtractionError::Corrupt(format!("lopdf aborted: {e}")))?
    }
}

/// Trims each line and drops blank ones. Engines pad lines heavily.
fn tidy_page(page: &str) -> String {
    page.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Which engine serves as primary. The other one is the fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PdfEngineKind {
    #[default]
    PdfExtract,
    Lopdf,
}

impl PdfEngineKind {
    /// `(primary, fallback)` engine pair.
    pub fn engines(self) -> (Arc<dyn PdfEngine>, Arc<dyn PdfEngine>) {
        match self {
            PdfEngineKind::PdfExtract => (Arc::new(PdfExtractEngine), Arc::new(LopdfEngine)),
            PdfEngineKind::Lopdf => (Arc::new(LopdfEngine), Arc::new(PdfExtractEngine)),
        }
    }
}

impl FromStr for PdfEngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf-extract" | "pdf_extract" => Ok(PdfEngineKind::PdfExtract),
            "lopdf" => Ok(PdfEngineKind::Lopdf),
            other => Err(format!(
                "unknown PDF engine '{other}' (expected 'pdf-extract' or 'lopdf')"
            )),
        }
    }
}

impl fmt::Display for PdfEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfEngineKind::PdfExtract => f.write_str("pdf-extract"),
            PdfEngineKind::Lopdf => f.write_str("lopdf"),
        }
    }
}
