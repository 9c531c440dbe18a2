// src/store/frontier.rs

//! Frontier rows: the set of URLs known to the crawler.

use sqlx::PgExecutor;

use crate::error::Result;
use crate::utils::url::{hostname, normalize, resolve};

const INSERT_BATCH_STMT: &str = "\
INSERT INTO frontier (url, url_norm, parent_url, depth, status)
SELECT fi.url, fi.url_norm, fi.parent_url, fi.depth, fi.status
FROM unnest($1::text[], $2::text[], $3::text[], $4::int[], $5::int[])
     AS fi(url, url_norm, parent_url, depth, status)
ON CONFLICT (url_norm) DO NOTHING
RETURNING url, url_norm, parent_url, depth, status";

/// Status of a frontier item in the crawling process.
///
/// `InProgress` is observable but never terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[repr(i32)]
pub enum FrontierStatus {
    Unvisited = 0,
    InProgress = 1,
    Completed = 2,
    Failed = 3,
}

/// A URL to be crawled, with metadata for the crawling process.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FrontierItem {
    /// Original URL
    pub url: String,
    /// Normalized URL, the dedup key
    pub url_norm: String,
    /// URL of the page that contained this link
    pub parent_url: Option<String>,
    /// Depth in the crawl tree
    pub depth: i32,
    pub status: FrontierStatus,
}

impl FrontierItem {
    /// Build a depth-0 item from a seed URL.
    pub fn from_seed(url: &str) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            url_norm: normalize(url)?,
            parent_url: None,
            depth: 0,
            status: FrontierStatus::Unvisited,
        })
    }

    /// Build a child item from a parent page and a raw href.
    pub fn from_parent(parent: &FrontierItem, href: &str) -> Result<Self> {
        let url = resolve(&parent.url, href)?;
        Ok(Self {
            url_norm: normalize(&url)?,
            url,
            parent_url: Some(parent.url.clone()),
            depth: parent.depth + 1,
            status: FrontierStatus::Unvisited,
        })
    }

    /// The lowercased host of the item's URL.
    pub fn domain(&self) -> Result<String> {
        hostname(&self.url)
    }
}

/// Insert a batch of items, returning the subset actually inserted.
///
/// Items whose `url_norm` already exists are silently dropped.
pub async fn insert_batch(
    executor: impl PgExecutor<'_>,
    items: &[FrontierItem],
) -> Result<Vec<FrontierItem>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let urls: Vec<String> = items.iter().map(|i| i.url.clone()).collect();
    let url_norms: Vec<String> = items.iter().map(|i| i.url_norm.clone()).collect();
    let parents: Vec<Option<String>> = items.iter().map(|i| i.parent_url.clone()).collect();
    let depths: Vec<i32> = items.iter().map(|i| i.depth).collect();
    let statuses: Vec<i32> = items.iter().map(|i| i.status as i32).collect();

    let inserted = sqlx::query_as::<_, FrontierItem>(INSERT_BATCH_STMT)
        .bind(&urls)
        .bind(&url_norms)
        .bind(&parents)
        .bind(&depths)
        .bind(&statuses)
        .fetch_all(executor)
        .await?;
    Ok(inserted)
}

/// Count all frontier items.
pub async fn count(executor: impl PgExecutor<'_>) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM frontier")
        .fetch_one(executor)
        .await?;
    Ok(n)
}

/// Count frontier items with a specific status.
pub async fn count_by_status(
    executor: impl PgExecutor<'_>,
    status: FrontierStatus,
) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM frontier WHERE status = $1")
        .bind(status as i32)
        .fetch_one(executor)
        .await?;
    Ok(n)
}

/// Select up to `limit` items with the given status, shallowest first.
///
/// Ties on depth break by storage order, which callers must not rely on.
pub async fn select_by_status_depth_sorted(
    executor: impl PgExecutor<'_>,
    status: FrontierStatus,
    limit: i64,
) -> Result<Vec<FrontierItem>> {
    let items = sqlx::query_as::<_, FrontierItem>(
        "SELECT url, url_norm, parent_url, depth, status FROM frontier
         WHERE status = $1 ORDER BY depth ASC LIMIT $2",
    )
    .bind(status as i32)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(items)
}

/// Update the status of the item identified by its normalized URL.
pub async fn update_status(
    executor: impl PgExecutor<'_>,
    url_norm: &str,
    status: FrontierStatus,
) -> Result<()> {
    sqlx::query("UPDATE frontier SET status = $1 WHERE url_norm = $2")
        .bind(status as i32)
        .bind(url_norm)
        .execute(executor)
        .await?;
    Ok(())
}

/// Reset stale `InProgress` rows back to `Unvisited`.
///
/// Run at queue startup so items orphaned by a crash get dequeued again.
pub async fn reset_in_progress(executor: impl PgExecutor<'_>) -> Result<u64> {
    let result = sqlx::query("UPDATE frontier SET status = $1 WHERE status = $2")
        .bind(FrontierStatus::Unvisited as i32)
        .bind(FrontierStatus::InProgress as i32)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Delete rows whose crawl has completed.
pub async fn delete_completed(executor: impl PgExecutor<'_>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM frontier WHERE status = $1")
        .bind(FrontierStatus::Completed as i32)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_seed_normalizes() {
        let item = FrontierItem::from_seed("HTTPS://Example.TEST/a/").unwrap();
        assert_eq!(item.url, "HTTPS://Example.TEST/a/");
        assert_eq!(item.url_norm, "https://example.test/a");
        assert_eq!(item.depth, 0);
        assert!(item.parent_url.is_none());
        assert_eq!(item.status, FrontierStatus::Unvisited);
    }

    #[test]
    fn test_from_parent_resolves_and_increments_depth() {
        let parent = FrontierItem::from_seed("https://example.test/a/b").unwrap();
        let child = FrontierItem::from_parent(&parent, "../c#frag").unwrap();
        assert_eq!(child.url, "https://example.test/c#frag");
        assert_eq!(child.url_norm, "https://example.test/c");
        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_url.as_deref(), Some("https://example.test/a/b"));
    }

    #[test]
    fn test_from_parent_rejects_bad_href() {
        let parent = FrontierItem::from_seed("https://example.test/").unwrap();
        assert!(FrontierItem::from_parent(&parent, "http://[broken").is_err());
    }

    #[test]
    fn test_domain() {
        let item = FrontierItem::from_seed("https://Example.TEST/a").unwrap();
        assert_eq!(item.domain().unwrap(), "example.test");
    }
}
