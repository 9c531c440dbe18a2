// src/store/posting.rs

//! Posting rows: the inverted index proper.

use sqlx::PgExecutor;

use crate::error::Result;

// Re-indexing a document overwrites its term frequencies.
const INSERT_BATCH_STMT: &str = "\
INSERT INTO postings (term_id, doc_id, tf_raw)
SELECT t.term_id, $1::bigint, t.tf_raw
FROM unnest($2::bigint[], $3::int[]) AS t(term_id, tf_raw)
ON CONFLICT (term_id, doc_id) DO UPDATE
SET tf_raw = EXCLUDED.tf_raw";

/// An inverted-index entry tying a term to a doc with an occurrence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct Posting {
    pub term_id: i64,
    pub doc_id: i64,
    pub tf_raw: i32,
}

/// Batch-upsert the postings of one document from parallel arrays.
///
/// Caller guarantees `term_id` and `doc_id` reference live rows; foreign
/// key violations here are a programming error.
pub async fn insert_batch(
    executor: impl PgExecutor<'_>,
    doc_id: i64,
    term_tfs: &[(i64, i32)],
) -> Result<()> {
    if term_tfs.is_empty() {
        return Ok(());
    }
    let term_ids: Vec<i64> = term_tfs.iter().map(|(id, _)| *id).collect();
    let tf_raws: Vec<i32> = term_tfs.iter().map(|(_, tf)| *tf).collect();

    sqlx::query(INSERT_BATCH_STMT)
        .bind(doc_id)
        .bind(&term_ids)
        .bind(&tf_raws)
        .execute(executor)
        .await?;
    Ok(())
}

/// Fetch all postings for a document.
pub async fn get_by_doc(executor: impl PgExecutor<'_>, doc_id: i64) -> Result<Vec<Posting>> {
    let postings = sqlx::query_as::<_, Posting>(
        "SELECT term_id, doc_id, tf_raw FROM postings WHERE doc_id = $1",
    )
    .bind(doc_id)
    .fetch_all(executor)
    .await?;
    Ok(postings)
}
