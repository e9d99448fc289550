//! qda-rv library - Report Viewer
//!
//! Read-only reports over a QDA project database: code tree, code
//! frequencies per coder, two-coder agreement and coded segment search.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Project database connection pool (read-only)
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/api/coders", get(api::get_coders))
        .route("/api/tree", get(api::get_code_tree))
        .route("/api/frequencies", get(api::get_frequencies))
        .route("/api/frequencies/export", get(api::export_frequencies))
        .route("/api/comparisons", get(api::get_comparisons))
        .route("/api/comparisons/export", get(api::export_comparisons))
        .route("/api/segments", get(api::search_segments))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
