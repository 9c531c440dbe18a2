// src/pipeline/driver.rs

//! The queue driver stage: dequeue -> emit, enqueue <- discovered links.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::queue::Queue;
use crate::store::frontier::FrontierItem;

/// A message carrying a frontier item to be crawled.
#[derive(Debug)]
pub struct CrawlerMessage {
    pub item: FrontierItem,
}

/// Owns the frontier queue and mediates between its two endpoints: an
/// outbound stream of items to crawl and an inbound stream of child links
/// discovered by the processor.
pub struct QueueDriver<Q> {
    queue: Q,
    out: mpsc::Sender<CrawlerMessage>,
    links: mpsc::Receiver<Vec<FrontierItem>>,
    cancel: CancellationToken,
}

impl<Q: Queue> QueueDriver<Q> {
    pub fn new(
        queue: Q,
        out: mpsc::Sender<CrawlerMessage>,
        links: mpsc::Receiver<Vec<FrontierItem>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            queue,
            out,
            links,
            cancel,
        }
    }

    /// Drive the queue until cancellation or the inbound stream closes.
    ///
    /// Each iteration selects between emitting the next dequeued item and
    /// accepting a batch of child links. When the queue is empty the emit
    /// arm is disabled but the enqueue arm stays live, so links flowing
    /// back in can wake the crawl up again.
    pub async fn run(self) {
        let QueueDriver {
            mut queue,
            out,
            mut links,
            cancel,
        } = self;

        match queue.len().await {
            Ok(0) => {
                warn!("frontier queue is empty, nothing to crawl");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to read queue length");
                return;
            }
            Ok(_) => {}
        }

        let mut pending: Option<FrontierItem> = None;
        loop {
            if pending.is_none() {
                match queue.dequeue().await {
                    Ok(item) => pending = item,
                    Err(e) => {
                        error!(error = %e, "dequeue failed, stopping driver");
                        break;
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("queue driver cancelled");
                    break;
                }
                permit = out.reserve(), if pending.is_some() => {
                    match permit {
                        Ok(permit) => {
                            let item = pending.take().expect("guarded by select condition");
                            info!(url = %item.url, depth = item.depth, "dispatching");
                            permit.send(CrawlerMessage { item });
                        }
                        Err(_) => {
                            debug!("crawl channel closed, stopping driver");
                            cancel.cancel();
                            break;
                        }
                    }
                }
                batch = links.recv() => {
                    match batch {
                        Some(items) => Self::enqueue_items(&mut queue, items).await,
                        None => {
                            debug!("link channel closed, stopping driver");
                            cancel.cancel();
                            break;
                        }
                    }
                }
            }
        }

        if let Err(e) = queue.close().await {
            warn!(error = %e, "frontier cleanup failed");
        }
    }

    /// Insert discovered links; duplicates are dropped by the store.
    async fn enqueue_items(queue: &mut Q, items: Vec<FrontierItem>) {
        let total = items.len();
        match queue.enqueue(items).await {
            Ok(inserted) => {
                debug!(total, inserted = inserted.len(), "enqueued child links")
            }
            // Racing inserts on url_norm are dedup working as intended.
            Err(e) if e.is_unique_violation() => {}
            Err(e) => warn!(error = %e, "enqueue failed"),
        }
    }
}
