//! Coded segment search
//!
//! Lists coded text, image regions and audio/video ranges for selected
//! codes. Selecting a category selects every code beneath it. Results can be
//! narrowed to files, cases, one coder, a text fragment, or files and cases
//! with matching attributes.

use axum::{
    extract::{Query, State},
    Json,
};
use qda_common::db::{self, AttributeFilter, SegmentQuery};
use qda_common::model::CodedSegment;
use serde::{Deserialize, Serialize};

use super::tree::load_code_tree;
use super::ApiError;
use crate::pagination::{paginate, PAGE_SIZE};
use crate::AppState;

/// Query parameters; id lists are comma-separated (`codes=1,4,9`)
///
/// `attributes` is a JSON array of attribute filters, e.g.
/// `[{"name":"age","target":"case","operator":">=","values":["30"],"numeric":true}]`
#[derive(Debug, Default, Deserialize)]
pub struct SegmentParams {
    pub codes: Option<String>,
    pub categories: Option<String>,
    pub files: Option<String>,
    pub cases: Option<String>,
    pub coder: Option<String>,
    pub search: Option<String>,
    pub attributes: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    /// Codes searched, after expanding categories
    pub code_ids: Vec<i64>,
    pub total_results: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub segments: Vec<CodedSegment>,
}

/// Parse a comma-separated id list; absent or blank means empty
fn parse_ids(name: &str, value: Option<&str>) -> Result<Vec<i64>, ApiError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid id in {}: {}", name, part)))
        })
        .collect()
}

fn parse_attributes(value: Option<&str>) -> Result<Vec<AttributeFilter>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|e| ApiError::BadRequest(format!("Invalid attributes: {}", e))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /api/segments?codes=&categories=&files=&cases=&coder=&search=&page=
pub async fn search_segments(
    State(state): State<AppState>,
    Query(params): Query<SegmentParams>,
) -> Result<Json<SegmentResponse>, ApiError> {
    let mut code_ids = parse_ids("codes", params.codes.as_deref())?;
    let category_ids = parse_ids("categories", params.categories.as_deref())?;

    if code_ids.is_empty() && category_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "No codes have been selected".to_string(),
        ));
    }

    if !category_ids.is_empty() {
        let tree = load_code_tree(&state.db).await?;
        for category_id in category_ids {
            code_ids.extend(tree.descendant_codes(category_id)?);
        }
    }
    let mut seen = std::collections::HashSet::new();
    code_ids.retain(|id| seen.insert(*id));

    let query = SegmentQuery {
        code_ids,
        file_ids: parse_ids("files", params.files.as_deref())?,
        case_ids: parse_ids("cases", params.cases.as_deref())?,
        coder: non_blank(params.coder),
        search_text: non_blank(params.search),
        attributes: parse_attributes(params.attributes.as_deref())?,
    };

    let total_results = db::count_segments(&state.db, &query).await?;
    let p = paginate(total_results, params.page);
    let segments = db::search_segments(&state.db, &query, PAGE_SIZE, p.offset).await?;

    Ok(Json(SegmentResponse {
        code_ids: query.code_ids,
        total_results,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
        segments,
    }))
}
