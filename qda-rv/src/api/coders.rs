//! Coder listing endpoint

use axum::{extract::State, Json};
use qda_common::db;
use serde::Serialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CodersResponse {
    /// Coders counted in the frequency report (text and image codings)
    pub frequency_coders: Vec<String>,
    /// Coders available for comparison (text, image and audio/video codings)
    pub comparison_coders: Vec<String>,
}

/// GET /api/coders
pub async fn get_coders(State(state): State<AppState>) -> Result<Json<CodersResponse>, ApiError> {
    Ok(Json(CodersResponse {
        frequency_coders: db::load_frequency_coders(&state.db).await?,
        comparison_coders: db::load_comparison_coders(&state.db).await?,
    }))
}
