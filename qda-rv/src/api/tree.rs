//! Code tree endpoint

use axum::{extract::State, Json};
use qda_common::analysis::{CodeTree, EntityRef};
use qda_common::db;
use serde::Serialize;
use sqlx::SqlitePool;

use super::ApiError;
use crate::AppState;

/// One node of the nested code tree
#[derive(Debug, Serialize)]
pub struct TreeNodeView {
    #[serde(flatten)]
    pub entity: EntityRef,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub children: Vec<TreeNodeView>,
}

#[derive(Debug, Serialize)]
pub struct CodeTreeResponse {
    pub categories: usize,
    pub codes: usize,
    pub roots: Vec<TreeNodeView>,
}

/// Load categories and codes and build the code tree
pub(crate) async fn load_code_tree(pool: &SqlitePool) -> Result<CodeTree, ApiError> {
    let categories = db::load_categories(pool).await?;
    let codes = db::load_codes(pool).await?;
    Ok(CodeTree::build(&categories, &codes)?)
}

fn nest(tree: &CodeTree, idx: usize) -> TreeNodeView {
    let node = &tree.nodes()[idx];
    TreeNodeView {
        entity: node.entity,
        name: node.name.clone(),
        color: node.color.clone(),
        children: node.children.iter().map(|&child| nest(tree, child)).collect(),
    }
}

/// GET /api/tree
///
/// Categories and codes as a nested forest. Top-level entries are root
/// categories followed by codes without a category.
pub async fn get_code_tree(State(state): State<AppState>) -> Result<Json<CodeTreeResponse>, ApiError> {
    let tree = load_code_tree(&state.db).await?;

    let categories = tree.nodes().iter().filter(|n| n.entity.is_category()).count();
    Ok(Json(CodeTreeResponse {
        categories,
        codes: tree.len() - categories,
        roots: tree.roots().iter().map(|&root| nest(&tree, root)).collect(),
    }))
}
