// src/store/search.rs

//! BM25 query evaluation against the inverted index.

use std::collections::HashSet;

use serde::Serialize;
use sqlx::PgPool;

use crate::error::Result;

/// BM25 term-saturation parameter.
pub const K1: f64 = 1.2;
/// BM25 length-normalization parameter.
pub const B: f64 = 0.75;

// Corpus statistics consider only docs with indexable content. The idf
// variant is floored at zero by the +1 inside the log; the HAVING clause
// enforces the minimum distinct-term match floor.
const SEARCH_BM25_STMT: &str = "\
WITH
  params AS (
    SELECT $4::real AS k1, $5::real AS b
  ),
  corpus AS (
    SELECT COUNT(*)::real AS total, AVG(len)::real AS avgdl
    FROM docs
    WHERE len > 0
  ),
  q AS (
    SELECT DISTINCT UNNEST($1::text[]) AS raw
  )
SELECT
  d.id,
  d.url,
  d.title,
  d.snippet,
  d.len,
  SUM(
    (LN(((corpus.total - t.df::real + 0.5) / (t.df::real + 0.5)) + 1.0))
    *
    (
      (p.tf_raw::real * (params.k1 + 1.0))
      /
      (p.tf_raw::real
        + params.k1 * (1.0 - params.b + params.b * (d.len::real / NULLIF(corpus.avgdl, 0)))
      )
    )
  )::float8 AS score
FROM q
JOIN terms t     ON t.raw = q.raw
JOIN postings p  ON p.term_id = t.id
JOIN docs d      ON d.id = p.doc_id
CROSS JOIN params
CROSS JOIN corpus
WHERE d.len > 0
  AND t.df IS NOT NULL
GROUP BY d.id, d.url, d.title, d.snippet, d.len
HAVING COUNT(DISTINCT t.raw) >= $2
ORDER BY score DESC
LIMIT $3";

/// A single ranked search result.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SearchResult {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub len: i32,
    pub score: f64,
}

/// Evaluate a BM25 query over the given terms.
///
/// Terms are deduped before matching. Docs must match at least
/// `min(distinct terms, 2)` distinct query terms to appear; results are
/// sorted by score descending and truncated to `limit`.
pub async fn search_bm25(
    pool: &PgPool,
    terms: &[String],
    limit: i64,
) -> Result<Vec<SearchResult>> {
    let mut seen = HashSet::new();
    let distinct: Vec<String> = terms
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect();
    if distinct.is_empty() {
        return Ok(Vec::new());
    }
    let min_match = distinct.len().min(2) as i64;

    let results = sqlx::query_as::<_, SearchResult>(SEARCH_BM25_STMT)
        .bind(&distinct)
        .bind(min_match)
        .bind(limit)
        .bind(K1 as f32)
        .bind(B as f32)
        .fetch_all(pool)
        .await?;
    Ok(results)
}
