//! Read-only queries feeding the report computations

use crate::model::{Category, Code, CodedInterval, CodingOwner, DocumentLength};
use crate::Result;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// All categories, ordered by name
pub async fn load_categories(pool: &SqlitePool) -> Result<Vec<Category>> {
    let rows = sqlx::query_as::<
        _,
        (
            String,
            i64,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<i64>,
        ),
    >("SELECT name, catid, owner, date, memo, supercatid FROM code_cat ORDER BY name")
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, id, owner, date, memo, parent_id)| Category {
            id,
            name,
            parent_id,
            owner,
            memo,
            date,
        })
        .collect())
}

/// All codes, ordered by name
pub async fn load_codes(pool: &SqlitePool) -> Result<Vec<Code>> {
    let rows = sqlx::query_as::<
        _,
        (
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            i64,
            Option<i64>,
            Option<String>,
        ),
    >("SELECT name, memo, owner, date, cid, catid, color FROM code_name ORDER BY name")
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, memo, owner, date, id, category_id, color)| Code {
            id,
            name,
            category_id,
            owner,
            memo,
            date,
            color,
        })
        .collect())
}

/// Coders who applied codes to text or images, sorted
pub async fn load_frequency_coders(pool: &SqlitePool) -> Result<Vec<String>> {
    let coders = sqlx::query_scalar::<_, String>(
        r#"
        SELECT owner FROM code_text WHERE owner IS NOT NULL
        UNION
        SELECT owner FROM code_image WHERE owner IS NOT NULL
        ORDER BY 1
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(coders)
}

/// Coders who applied codes to text, images or audio/video, sorted
pub async fn load_comparison_coders(pool: &SqlitePool) -> Result<Vec<String>> {
    let coders = sqlx::query_scalar::<_, String>(
        r#"
        SELECT owner FROM code_text WHERE owner IS NOT NULL
        UNION
        SELECT owner FROM code_image WHERE owner IS NOT NULL
        UNION
        SELECT owner FROM code_av WHERE owner IS NOT NULL
        ORDER BY 1
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(coders)
}

/// One row per text or image coding
pub async fn load_coding_owners(pool: &SqlitePool) -> Result<Vec<CodingOwner>> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        r#"
        SELECT cid, owner FROM code_text WHERE owner IS NOT NULL
        UNION ALL
        SELECT cid, owner FROM code_image WHERE owner IS NOT NULL
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(code_id, coder)| CodingOwner { code_id, coder })
        .collect())
}

/// Character length of every text source (sources without a media path)
pub async fn load_text_document_lengths(pool: &SqlitePool) -> Result<Vec<DocumentLength>> {
    let rows = sqlx::query_as::<_, (i64, Option<i64>)>(
        "SELECT id, length(fulltext) FROM source WHERE mediapath IS NULL ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(document_id, length)| DocumentLength {
            document_id,
            length: length.unwrap_or(0).max(0) as usize,
        })
        .collect())
}

/// Coded text intervals of the given coders, for all codes
pub async fn load_text_intervals(pool: &SqlitePool, coders: &[&str]) -> Result<Vec<CodedInterval>> {
    if coders.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT cid, fid, owner, pos0, pos1 FROM code_text WHERE owner IN (");
    let mut separated = builder.separated(", ");
    for coder in coders {
        separated.push_bind(*coder);
    }
    separated.push_unseparated(") ORDER BY cid, fid, pos0");

    let rows = builder
        .build_query_as::<(i64, i64, String, i64, i64)>()
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(code_id, document_id, coder, start, end)| CodedInterval {
            code_id,
            document_id,
            coder,
            start,
            end,
        })
        .collect())
}
