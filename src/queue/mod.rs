// src/queue/mod.rs

//! The persistent URL frontier queue.
//!
//! A breadth-first queue over the `frontier` table with an in-memory
//! prefetch buffer. The buffer is a pure optimization: correctness falls
//! entirely to the backing store, and a buffer of size 1 must behave the
//! same as a large one, just slower.

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::store::frontier::{self, FrontierItem, FrontierStatus};
use crate::store::Store;

/// Queue operations used by the crawl pipeline.
#[async_trait]
pub trait Queue: Send {
    /// Add items, returning the subset actually inserted (duplicates on
    /// the normalized URL are silently dropped).
    async fn enqueue(&mut self, items: Vec<FrontierItem>) -> Result<Vec<FrontierItem>>;

    /// Remove and return the next item, or `None` when empty.
    async fn dequeue(&mut self) -> Result<Option<FrontierItem>>;

    /// Unvisited items in storage plus items still buffered.
    async fn len(&self) -> Result<i64>;

    /// Clean up completed rows, best effort.
    async fn close(&self) -> Result<()>;
}

/// SQL-backed frontier queue with a bounded prefetch buffer.
pub struct FrontierQueue {
    store: Store,
    buffer: VecDeque<FrontierItem>,
    buf_size: usize,
}

impl FrontierQueue {
    /// Create a queue, recover stale `InProgress` rows, and insert seeds.
    ///
    /// Seed URLs that fail to normalize are logged and skipped. The seed
    /// count must not exceed the buffer size.
    pub async fn new(store: Store, buf_size: usize, seeds: &[String]) -> Result<Self> {
        if seeds.is_empty() {
            return Err(AppError::config("seed list cannot be empty"));
        }
        if seeds.len() > buf_size {
            return Err(AppError::config(format!(
                "seed count {} exceeds frontier buffer size {}",
                seeds.len(),
                buf_size
            )));
        }

        let reset = frontier::reset_in_progress(&store.pool).await?;
        if reset > 0 {
            info!(count = reset, "reset stale in-progress frontier items");
        }

        let mut items = Vec::with_capacity(seeds.len());
        for seed in seeds {
            match FrontierItem::from_seed(seed) {
                Ok(item) => items.push(item),
                Err(e) => warn!(seed = %seed, error = %e, "skipping unparseable seed"),
            }
        }
        let inserted = frontier::insert_batch(&store.pool, &items).await?;
        debug!(
            seeds = items.len(),
            inserted = inserted.len(),
            "seeded frontier"
        );

        Ok(Self {
            store,
            buffer: VecDeque::with_capacity(buf_size),
            buf_size,
        })
    }

    /// Refill the buffer with unvisited items, shallowest first.
    async fn refill(&mut self) -> Result<()> {
        let items = frontier::select_by_status_depth_sorted(
            &self.store.pool,
            FrontierStatus::Unvisited,
            self.buf_size as i64,
        )
        .await?;
        self.buffer.extend(items);
        Ok(())
    }
}

#[async_trait]
impl Queue for FrontierQueue {
    async fn enqueue(&mut self, items: Vec<FrontierItem>) -> Result<Vec<FrontierItem>> {
        frontier::insert_batch(&self.store.pool, &items).await
    }

    async fn dequeue(&mut self) -> Result<Option<FrontierItem>> {
        if self.buffer.is_empty() {
            self.refill().await?;
        }

        // Flip the head to InProgress before surfacing it. On failure the
        // buffer is left untouched so a retry sees the same head.
        let Some(head) = self.buffer.front() else {
            return Ok(None);
        };
        frontier::update_status(&self.store.pool, &head.url_norm, FrontierStatus::InProgress)
            .await?;

        let mut item = self.buffer.pop_front().expect("head checked above");
        item.status = FrontierStatus::InProgress;
        Ok(Some(item))
    }

    async fn len(&self) -> Result<i64> {
        let stored =
            frontier::count_by_status(&self.store.pool, FrontierStatus::Unvisited).await?;
        Ok(stored + self.buffer.len() as i64)
    }

    async fn close(&self) -> Result<()> {
        let deleted = frontier::delete_completed(&self.store.pool).await?;
        debug!(deleted, "cleaned up completed frontier items");
        Ok(())
    }
}
