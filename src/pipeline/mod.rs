// src/pipeline/mod.rs

//! The crawl-and-index pipeline.
//!
//! Four cooperating tasks connected by bounded channels, all sharing one
//! cancellation token:
//!
//! ```text
//! QueueDriver --(CrawlerMessage)--> Fetcher --(ProcessorMessage)--> Processor
//!      ^                                                              |
//!      +-------------(Vec<FrontierItem> child links)------------------+
//!                                                                     |
//!                              Indexer <--------(IndexMessage)--------+
//! ```
//!
//! Back-pressure is structural: a slow Indexer blocks the Processor, a
//! slow Processor blocks the Fetcher, and a slow Fetcher blocks the
//! driver's emit arm without stopping its enqueue arm. Errors on a single
//! URL are local: the item is marked `Failed` and the pipeline continues.

pub mod driver;
pub mod fetcher;
pub mod indexer;
pub mod processor;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::config::CrawlerConfig;
use crate::error::Result;
use crate::pipeline::driver::QueueDriver;
use crate::pipeline::fetcher::Fetcher;
use crate::pipeline::indexer::Indexer;
use crate::pipeline::processor::Processor;
use crate::queue::FrontierQueue;
use crate::store::frontier::{self, FrontierStatus};
use crate::store::Store;

/// Capacity of the Fetcher -> Processor channel and of the child-link
/// channel back into the driver. Everything else is as close to
/// unbuffered as tokio allows.
const FETCH_BUFFER: usize = 100;
const LINK_BUFFER: usize = 100;

/// The assembled crawl pipeline.
pub struct Pipeline {
    driver: QueueDriver<FrontierQueue>,
    fetcher: Fetcher,
    processor: Processor,
    indexer: Indexer,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Wire up the pipeline: build the queue, insert seeds, and connect
    /// the stage channels.
    pub async fn new(
        store: Store,
        config: &CrawlerConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let queue = FrontierQueue::new(store.clone(), config.frontier_buffer, &config.seeds).await?;

        let (crawl_tx, crawl_rx) = mpsc::channel(1);
        let (proc_tx, proc_rx) = mpsc::channel(FETCH_BUFFER);
        let (link_tx, link_rx) = mpsc::channel(LINK_BUFFER);
        let (index_tx, index_rx) = mpsc::channel(1);

        let driver = QueueDriver::new(queue, crawl_tx, link_rx, cancel.clone());
        let fetcher = Fetcher::new(store.clone(), config, crawl_rx, proc_tx, cancel.clone())?;
        let processor = Processor::new(
            store.clone(),
            config.supported_languages(),
            proc_rx,
            link_tx,
            index_tx,
            cancel.clone(),
        );
        let indexer = Indexer::new(store, index_rx, cancel.clone());

        Ok(Self {
            driver,
            fetcher,
            processor,
            indexer,
            cancel,
        })
    }

    /// Run every stage to completion.
    ///
    /// Returns once all stages have observed cancellation or their
    /// upstream channels closed.
    pub async fn run(self) {
        let driver = tokio::spawn(self.driver.run());
        let fetcher = tokio::spawn(self.fetcher.run());
        let processor = tokio::spawn(self.processor.run());

        // The indexer runs on this task; everything unwinds through the
        // shared token once any stage stops.
        self.indexer.run().await;
        self.cancel.cancel();

        for (name, handle) in [
            ("driver", driver),
            ("fetcher", fetcher),
            ("processor", processor),
        ] {
            if let Err(e) = handle.await {
                error!(stage = name, error = %e, "pipeline stage panicked");
            }
        }
    }
}

/// Mark a frontier item `Failed` on a fresh connection.
///
/// Used by every stage when an item-local error occurs; failures here are
/// logged and swallowed so one bad URL never aborts the pipeline.
pub(crate) async fn mark_failed(store: &Store, url_norm: &str) {
    if let Err(e) = frontier::update_status(&store.pool, url_norm, FrontierStatus::Failed).await {
        error!(url_norm = %url_norm, error = %e, "failed to mark frontier item as failed");
    }
}
