//! Project database creation
//!
//! Creates the tables of a project database. The report tools only read;
//! this exists so tooling and tests can produce a database with the same
//! layout the desktop application writes.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

const PROJECT_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS project (databaseversion text, date text, memo text, about text)",
    "CREATE TABLE IF NOT EXISTS source (id integer primary key, name text, fulltext text, mediapath text, memo text, owner text, date text, unique(name))",
    "CREATE TABLE IF NOT EXISTS code_image (imid integer primary key, id integer, x1 integer, y1 integer, width integer, height integer, cid integer, memo text, date text, owner text)",
    "CREATE TABLE IF NOT EXISTS code_av (avid integer primary key, id integer, pos0 integer, pos1 integer, cid integer, memo text, date text, owner text)",
    "CREATE TABLE IF NOT EXISTS annotation (anid integer primary key, fid integer, pos0 integer, pos1 integer, memo text, owner text, date text)",
    "CREATE TABLE IF NOT EXISTS attribute_type (name text primary key, date text, owner text, memo text, caseOrFile text, valuetype text)",
    "CREATE TABLE IF NOT EXISTS attribute (attrid integer primary key, name text, attr_type text, value text, id integer, date text, owner text)",
    "CREATE TABLE IF NOT EXISTS case_text (id integer primary key, caseid integer, fid integer, pos0 integer, pos1 integer, owner text, date text, memo text)",
    "CREATE TABLE IF NOT EXISTS cases (caseid integer primary key, name text, memo text, owner text, date text, constraint ucm unique(name))",
    "CREATE TABLE IF NOT EXISTS code_cat (catid integer primary key, name text, owner text, date text, memo text, supercatid integer, unique(name))",
    "CREATE TABLE IF NOT EXISTS code_text (cid integer, fid integer, seltext text, pos0 integer, pos1 integer, owner text, date text, memo text, unique(cid, fid, pos0, pos1, owner))",
    "CREATE TABLE IF NOT EXISTS code_name (cid integer primary key, name text, memo text, catid integer, owner text, date text, color text, unique(name))",
    "CREATE TABLE IF NOT EXISTS journal (jid integer primary key, name text, jentry text, date text, owner text)",
];

/// Open (creating if needed) a project database and ensure its tables exist
pub async fn init_project_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    for statement in PROJECT_TABLES {
        sqlx::query(statement).execute(&pool).await?;
    }

    if newly_created {
        info!("Initialized new project database: {}", db_path.display());
    } else {
        info!("Opened existing project database: {}", db_path.display());
    }

    Ok(pool)
}
