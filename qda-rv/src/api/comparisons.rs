//! Coder comparison endpoints
//!
//! Compares two coders' text coding for every code: percent agreement and
//! Cohen's Kappa.

use axum::{
    extract::{Query, State},
    Json,
};
use qda_common::analysis::{compare_codes, CodeComparison, CoderPair};
use qda_common::db;
use qda_common::report::render_comparison_text;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use super::tree::load_code_tree;
use super::ApiError;
use crate::AppState;

/// Query parameters naming the two coders
#[derive(Debug, Deserialize)]
pub struct ComparisonQuery {
    #[serde(default)]
    pub coder_a: String,
    #[serde(default)]
    pub coder_b: String,
}

#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    pub coders: [String; 2],
    pub comparisons: Vec<CodeComparison>,
}

async fn run_comparison(
    pool: &SqlitePool,
    query: ComparisonQuery,
) -> Result<(CoderPair, Vec<CodeComparison>), ApiError> {
    let pair = CoderPair::new(query.coder_a, query.coder_b)?;

    let tree = load_code_tree(pool).await?;
    let documents = db::load_text_document_lengths(pool).await?;
    let intervals = db::load_text_intervals(pool, &[pair.first(), pair.second()]).await?;

    // Character coverage is proportional to corpus size
    let comparisons = tokio::task::spawn_blocking({
        let pair = pair.clone();
        move || compare_codes(&tree, &pair, &documents, &intervals)
    })
    .await?;

    info!(
        coders = %pair,
        codes = comparisons.len(),
        "Calculated coder comparison"
    );
    Ok((pair, comparisons))
}

/// GET /api/comparisons?coder_a=NAME&coder_b=NAME
pub async fn get_comparisons(
    State(state): State<AppState>,
    Query(query): Query<ComparisonQuery>,
) -> Result<Json<ComparisonResponse>, ApiError> {
    let (pair, comparisons) = run_comparison(&state.db, query).await?;
    Ok(Json(ComparisonResponse {
        coders: [pair.first().to_string(), pair.second().to_string()],
        comparisons,
    }))
}

/// GET /api/comparisons/export?coder_a=NAME&coder_b=NAME
///
/// The comparison report as plain text
pub async fn export_comparisons(
    State(state): State<AppState>,
    Query(query): Query<ComparisonQuery>,
) -> Result<String, ApiError> {
    let (pair, comparisons) = run_comparison(&state.db, query).await?;
    Ok(render_comparison_text(&pair, &comparisons))
}
