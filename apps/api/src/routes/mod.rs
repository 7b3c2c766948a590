pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::ingest::handlers as ingest;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume ingestion API
        .route("/api/v1/resumes/ingest", post(ingest::handle_ingest))
        .route("/api/v1/resumes/parse", post(resume::handle_parse))
        .route("/api/v1/resumes/import", post(ingest::handle_import))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
