//! Document ingestion: format sniffing, text extraction with fallbacks,
//! quality gating and diagnostics. Produces plain text for the resume parser.

pub mod diagnostics;
pub mod extract;
pub mod handlers;
pub mod pipeline;
pub mod quality;
pub mod sniffer;

// Re-export the public API consumed by handlers and library callers.
pub use diagnostics::DiagnosticsReport;
pub use extract::pdf::{PdfEngine, PdfEngineKind};
pub use pipeline::{FailureCode, IngestFailure, IngestMetadata, IngestPipeline, IngestSuccess};
pub use quality::{assess_quality, QualityAssessment, QualityTier};
pub use sniffer::detect_format;
