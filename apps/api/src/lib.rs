pub mod config;
pub mod errors;
pub mod ingest;
pub mod models;
pub mod resume;
pub mod routes;
pub mod state;
