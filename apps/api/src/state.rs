use crate::config::Config;
use crate::ingest::IngestPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Immutable engine handles only; safe to share across concurrent uploads.
    pub pipeline: IngestPipeline,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let pipeline = IngestPipeline::with_engines(config.pdf_engine);
        Self { config, pipeline }
    }
}
