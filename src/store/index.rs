// src/store/index.rs

//! The per-document index write path.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::store::{doc, posting, term};
use crate::utils::url::{hostname, normalize};

/// A document ready to be indexed, decomposed at commit time across
/// `docs`, `terms`, and `postings`.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Original URL
    pub url: String,
    /// Normalized URL, keyed against the frontier
    pub url_norm: String,
    /// Host of the URL
    pub domain: String,
    /// Content hash for duplicate detection
    pub hash: String,
    /// Token count including repeats
    pub len: i32,
    /// Term to raw frequency map
    pub term_freqs: HashMap<String, i32>,
    /// Page title, when the document carried one
    pub title: Option<String>,
    /// Leading visible text for result display
    pub snippet: Option<String>,
}

impl IndexEntry {
    pub fn new(
        url: &str,
        hash: String,
        len: i32,
        term_freqs: HashMap<String, i32>,
    ) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            url_norm: normalize(url)?,
            domain: hostname(url)?,
            hash,
            len,
            term_freqs,
            title: None,
            snippet: None,
        })
    }

    pub fn with_display_fields(mut self, title: Option<String>, snippet: Option<String>) -> Self {
        self.title = title;
        self.snippet = snippet;
        self
    }
}

/// Index one document inside an open transaction.
///
/// Runs, in order: the (domain, hash) duplicate probe, the doc upsert,
/// the term upserts, and the postings batch. The caller owns the
/// transaction and is responsible for the frontier flip and the commit,
/// so "indexed" and "completed" become observable atomically.
pub async fn index_document(conn: &mut PgConnection, entry: &IndexEntry) -> Result<()> {
    if doc::find_by_domain_hash(&mut *conn, &entry.domain, &entry.hash)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateContent {
            domain: entry.domain.clone(),
            hash: entry.hash.clone(),
        });
    }

    let doc_id = doc::upsert(&mut *conn, entry).await?;

    let raws: Vec<String> = entry.term_freqs.keys().cloned().collect();
    let term_rows = term::upsert_batch(&mut *conn, &raws).await?;

    let mut term_tfs = Vec::with_capacity(term_rows.len());
    for (term_id, raw) in term_rows {
        match entry.term_freqs.get(&raw) {
            Some(tf) => term_tfs.push((term_id, *tf)),
            // Every returned raw came from the input map; a miss means the
            // store returned a term we never sent.
            None => warn!(term = %raw, "term upsert returned an unknown raw, skipping"),
        }
    }

    posting::insert_batch(&mut *conn, doc_id, &term_tfs).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_norm_and_domain() {
        let entry = IndexEntry::new(
            "https://Example.TEST/a/?b=2&b=1",
            "abc123".to_string(),
            3,
            HashMap::from([("hello".to_string(), 2), ("world".to_string(), 1)]),
        )
        .unwrap();
        assert_eq!(entry.url, "https://Example.TEST/a/?b=2&b=1");
        assert_eq!(entry.url_norm, "https://example.test/a?b=1&b=2");
        assert_eq!(entry.domain, "example.test");
        assert_eq!(entry.len, 3);
    }

    #[test]
    fn test_new_rejects_unparseable_url() {
        assert!(IndexEntry::new("::not-a-url::", String::new(), 0, HashMap::new()).is_err());
    }
}
