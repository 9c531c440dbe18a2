// src/store/doc.rs

//! Document rows: one per successfully indexed URL.

use sqlx::PgExecutor;

use crate::error::Result;
use crate::store::index::IndexEntry;

// The conflict arm refreshes the mutable page attributes so a re-crawl
// keeps them current, and doubles as the uniform RETURNING path.
const UPSERT_STMT: &str = "\
INSERT INTO docs (url, domain, hash, len, title, snippet)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (url) DO UPDATE SET
    len = EXCLUDED.len,
    title = EXCLUDED.title,
    snippet = EXCLUDED.snippet
RETURNING id";

/// A stored document.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Doc {
    pub id: i64,
    pub url: String,
    pub domain: String,
    pub hash: String,
    pub len: i32,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub norm: Option<f32>,
}

/// Look up the id of a document with this (domain, hash) pair, if any.
///
/// Used as the duplicate-content probe before an upsert.
pub async fn find_by_domain_hash(
    executor: impl PgExecutor<'_>,
    domain: &str,
    hash: &str,
) -> Result<Option<i64>> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM docs WHERE domain = $1 AND hash = $2")
            .bind(domain)
            .bind(hash)
            .fetch_optional(executor)
            .await?;
    Ok(row.map(|(id,)| id))
}

/// Upsert a document and return its id.
pub async fn upsert(executor: impl PgExecutor<'_>, entry: &IndexEntry) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as(UPSERT_STMT)
        .bind(&entry.url)
        .bind(&entry.domain)
        .bind(&entry.hash)
        .bind(entry.len)
        .bind(&entry.title)
        .bind(&entry.snippet)
        .fetch_one(executor)
        .await?;
    Ok(id)
}

/// Fetch a document by id.
pub async fn get_by_id(executor: impl PgExecutor<'_>, id: i64) -> Result<Option<Doc>> {
    let doc = sqlx::query_as::<_, Doc>(
        "SELECT id, url, domain, hash, len, title, snippet, norm FROM docs WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(doc)
}

/// Fetch documents by id set.
pub async fn get_by_ids(executor: impl PgExecutor<'_>, ids: &[i64]) -> Result<Vec<Doc>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let docs = sqlx::query_as::<_, Doc>(
        "SELECT id, url, domain, hash, len, title, snippet, norm FROM docs WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;
    Ok(docs)
}

/// Count documents with indexable content.
pub async fn count_indexed(executor: impl PgExecutor<'_>) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM docs WHERE len > 0")
        .fetch_one(executor)
        .await?;
    Ok(n)
}
