// src/store/rank.rs

//! Ranking statistics: the three set-wise update phases.
//!
//! Each phase is a single SQL statement over the whole corpus. Phase 2
//! depends on phase 1 and phase 3 on phase 2, so callers run them in
//! order.

use sqlx::PgPool;

use crate::error::Result;

// Phase 1: df = number of postings per term.
const UPDATE_DF_STMT: &str = "\
UPDATE terms t
SET df = x.df
FROM (
  SELECT term_id, COUNT(*)::int AS df
  FROM postings
  GROUP BY term_id
) x
WHERE t.id = x.term_id";

// Terms with no postings get df = 0.
const ZERO_DF_STMT: &str = "\
UPDATE terms SET df = 0
WHERE df IS NULL
   OR id NOT IN (SELECT DISTINCT term_id FROM postings)";

// Phase 2: smoothed idf = ln((N + 1)/(df + 1)) + 1, strictly positive.
const UPDATE_IDF_STMT: &str = "\
WITH n AS (
  SELECT COUNT(*)::real AS total FROM docs
)
UPDATE terms t
SET idf = LN((n.total + 1.0) / (t.df + 1.0)) + 1.0
FROM n";

// Phase 3: norm = sqrt(sum(((1 + ln tf) * idf)^2)) over a doc's postings.
const UPDATE_NORM_STMT: &str = "\
UPDATE docs d
SET norm = x.norm
FROM (
  SELECT
    p.doc_id,
    SQRT(SUM(POWER((1.0 + LN(p.tf_raw::real)) * t.idf, 2))) AS norm
  FROM postings p
  JOIN terms t ON t.id = p.term_id
  GROUP BY p.doc_id
) x
WHERE d.id = x.doc_id";

// Docs with no postings get norm = 0.
const ZERO_NORM_STMT: &str = "\
UPDATE docs SET norm = 0
WHERE norm IS NULL
   OR id NOT IN (SELECT DISTINCT doc_id FROM postings)";

/// Phase 1: recompute document frequency for every term.
pub async fn update_document_frequency(pool: &PgPool) -> Result<()> {
    sqlx::query(UPDATE_DF_STMT).execute(pool).await?;
    sqlx::query(ZERO_DF_STMT).execute(pool).await?;
    Ok(())
}

/// Phase 2: recompute smoothed inverse document frequency.
pub async fn update_inverse_document_frequency(pool: &PgPool) -> Result<()> {
    sqlx::query(UPDATE_IDF_STMT).execute(pool).await?;
    Ok(())
}

/// Phase 3: recompute the TF-IDF vector magnitude for every doc.
pub async fn update_document_norms(pool: &PgPool) -> Result<()> {
    sqlx::query(UPDATE_NORM_STMT).execute(pool).await?;
    sqlx::query(ZERO_NORM_STMT).execute(pool).await?;
    Ok(())
}
