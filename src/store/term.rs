// src/store/term.rs

//! Term rows: one per unique lowercase token ever sighted.

use sqlx::PgExecutor;

use crate::error::Result;

// Dummy update to get an id back for terms that already exist.
const UPSERT_STMT: &str = "\
INSERT INTO terms (raw) SELECT unnest($1::text[])
ON CONFLICT (raw) DO UPDATE SET
    raw = EXCLUDED.raw
RETURNING id, raw";

/// Upsert a batch of raw terms, returning `(id, raw)` for every input.
pub async fn upsert_batch(
    executor: impl PgExecutor<'_>,
    raws: &[String],
) -> Result<Vec<(i64, String)>> {
    if raws.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<(i64, String)> = sqlx::query_as(UPSERT_STMT)
        .bind(raws)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Look up a term id by its raw form.
pub async fn get_id_by_raw(executor: impl PgExecutor<'_>, raw: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM terms WHERE raw = $1")
        .bind(raw)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(|(id,)| id))
}

/// Fetch `(df, idf)` for a raw term.
pub async fn get_stats_by_raw(
    executor: impl PgExecutor<'_>,
    raw: &str,
) -> Result<Option<(Option<i32>, Option<f32>)>> {
    let row: Option<(Option<i32>, Option<f32>)> =
        sqlx::query_as("SELECT df, idf FROM terms WHERE raw = $1")
            .bind(raw)
            .fetch_optional(executor)
            .await?;
    Ok(row)
}
