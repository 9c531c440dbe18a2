// src/pipeline/indexer.rs

//! The index stage: atomic per-document commit.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::mark_failed;
use crate::store::frontier::{self, FrontierStatus};
use crate::store::index::{self, IndexEntry};
use crate::store::Store;

/// A message carrying an index entry to be committed.
#[derive(Debug)]
pub struct IndexMessage {
    pub entry: IndexEntry,
}

/// Consumes index entries and commits each in a single transaction:
/// dedup probe, doc upsert, term upserts, postings batch, frontier flip.
/// Either the whole document lands or none of it does.
pub struct Indexer {
    store: Store,
    input: mpsc::Receiver<IndexMessage>,
    cancel: CancellationToken,
}

impl Indexer {
    pub fn new(
        store: Store,
        input: mpsc::Receiver<IndexMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            input,
            cancel,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("indexer cancelled");
                    return;
                }
                msg = self.input.recv() => {
                    let Some(IndexMessage { entry }) = msg else {
                        debug!("index channel closed, stopping indexer");
                        self.cancel.cancel();
                        return;
                    };
                    match self.commit(&entry).await {
                        Ok(()) => info!(url = %entry.url, len = entry.len, "indexed document"),
                        Err(e) => {
                            warn!(url = %entry.url, error = %e, "indexing failed");
                            mark_failed(&self.store, &entry.url_norm).await;
                        }
                    }
                }
            }
        }
    }

    /// Run the full per-document write path in one transaction.
    ///
    /// Dropping the transaction on the error path rolls it back; the
    /// `Failed` status is then written on a fresh connection by the
    /// caller.
    async fn commit(&self, entry: &IndexEntry) -> Result<()> {
        let mut tx = self.store.pool.begin().await?;
        index::index_document(&mut tx, entry).await?;
        frontier::update_status(&mut *tx, &entry.url_norm, FrontierStatus::Completed).await?;
        tx.commit().await?;
        Ok(())
    }
}
