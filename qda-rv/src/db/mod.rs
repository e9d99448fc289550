//! Database access for qda-rv
//!
//! The report viewer never writes to a project.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

/// Connect to a project database in read-only mode
///
/// Uses SQLite `mode=ro` so the desktop application's data cannot be
/// modified, and `immutable=1` so SQLite does not write journal files.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!(
            "Project database not found: {}\nIs this a project created by the desktop application?",
            db_path.display()
        );
    }

    let db_url = format!("sqlite://{}?mode=ro&immutable=1", db_path.display());

    let pool = SqlitePool::connect(&db_url)
        .await
        .context("Failed to connect to project database in read-only mode")?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_database_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = connect_readonly(&dir.path().join("absent.qda").join("data.qda")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_readonly_connection_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("study.qda").join("data.qda");
        let writer = qda_common::db::init_project_database(&db_path).await.unwrap();
        writer.close().await;

        let pool = connect_readonly(&db_path)
            .await
            .expect("Should connect in read-only mode");

        let result = sqlx::query("CREATE TABLE _test (id INTEGER)")
            .execute(&pool)
            .await;
        assert!(result.is_err(), "Write operation should fail in read-only mode");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM code_name")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
