//! Code frequency report endpoints

use axum::{extract::State, Json};
use qda_common::analysis::{aggregate, tally_codings, FrequencyReport};
use qda_common::db;
use qda_common::report::render_frequency_text;
use sqlx::SqlitePool;
use tracing::info;

use super::tree::load_code_tree;
use super::ApiError;
use crate::AppState;

async fn frequency_report(pool: &SqlitePool) -> Result<FrequencyReport, ApiError> {
    let tree = load_code_tree(pool).await?;
    let coders = db::load_frequency_coders(pool).await?;
    let counts = tally_codings(&db::load_coding_owners(pool).await?);
    Ok(aggregate(&tree, &coders, &counts))
}

/// GET /api/frequencies
///
/// Per-coder and total coding counts for every code and category. Category
/// counts include all codes nested beneath them.
pub async fn get_frequencies(
    State(state): State<AppState>,
) -> Result<Json<FrequencyReport>, ApiError> {
    Ok(Json(frequency_report(&state.db).await?))
}

/// GET /api/frequencies/export
///
/// The frequency report as plain text
pub async fn export_frequencies(State(state): State<AppState>) -> Result<String, ApiError> {
    let report = frequency_report(&state.db).await?;
    info!(rows = report.rows.len(), "Exported coding frequencies");
    Ok(render_frequency_text(&report))
}
