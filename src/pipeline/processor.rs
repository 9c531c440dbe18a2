// src/pipeline/processor.rs

//! The processing stage: parse, extract, and fan out.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;
use crate::extract::{self, Extracted, HtmlParser, Language};
use crate::pipeline::fetcher::ProcessorMessage;
use crate::pipeline::indexer::IndexMessage;
use crate::pipeline::mark_failed;
use crate::store::frontier::FrontierItem;
use crate::store::index::IndexEntry;
use crate::store::Store;

/// Parses fetched pages, then delivers the extracted content to the
/// indexer and the discovered links back to the queue driver. Both sends
/// must be accepted before the stage advances to the next page.
pub struct Processor {
    store: Store,
    parser: HtmlParser,
    input: mpsc::Receiver<ProcessorMessage>,
    links: mpsc::Sender<Vec<FrontierItem>>,
    index: mpsc::Sender<IndexMessage>,
    cancel: CancellationToken,
}

impl Processor {
    pub fn new(
        store: Store,
        langs: Vec<Language>,
        input: mpsc::Receiver<ProcessorMessage>,
        links: mpsc::Sender<Vec<FrontierItem>>,
        index: mpsc::Sender<IndexMessage>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            parser: HtmlParser::new(langs),
            input,
            links,
            index,
            cancel,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("processor cancelled");
                    return;
                }
                msg = self.input.recv() => {
                    let Some(msg) = msg else {
                        debug!("fetch channel closed, stopping processor");
                        self.cancel.cancel();
                        return;
                    };
                    self.process(msg).await;
                }
            }
        }
    }

    async fn process(&mut self, msg: ProcessorMessage) {
        // Parsing is synchronous; the parsed DOM never crosses an await.
        let extracted = match self.extract_content(&msg.body) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!(url = %msg.item.url, error = %e, "processing failed");
                mark_failed(&self.store, &msg.item.url_norm).await;
                return;
            }
        };

        let entry = match IndexEntry::new(
            &msg.item.url,
            extracted.hash,
            extracted.len,
            extracted.term_freqs,
        ) {
            Ok(entry) => entry.with_display_fields(extracted.title, extracted.snippet),
            Err(e) => {
                warn!(url = %msg.item.url, error = %e, "index entry construction failed");
                mark_failed(&self.store, &msg.item.url_norm).await;
                return;
            }
        };
        let children = child_items(&msg.item, &extracted.links);

        // Deliver to both sinks concurrently; each send also watches the
        // cancellation token so shutdown can interrupt a full channel.
        let send_links = async {
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                sent = self.links.send(children) => {
                    if sent.is_ok() {
                        debug!(url = %msg.item.url, "links delivered to queue");
                    }
                }
            }
        };
        let send_index = async {
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                sent = self.index.send(IndexMessage { entry }) => {
                    if sent.is_ok() {
                        debug!(url = %msg.item.url, "entry delivered to indexer");
                    }
                }
            }
        };
        tokio::join!(send_links, send_index);
    }

    /// Parse and extract in one synchronous step.
    fn extract_content(&self, body: &str) -> Result<Extracted> {
        let doc = self.parser.parse(body)?;
        Ok(extract::extract(&doc))
    }
}

/// Resolve discovered hrefs into child frontier items.
///
/// Items whose resolution or normalization fails are dropped with a
/// warning.
fn child_items(parent: &FrontierItem, links: &[String]) -> Vec<FrontierItem> {
    let mut items = Vec::with_capacity(links.len());
    for href in links {
        match FrontierItem::from_parent(parent, href) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(parent = %parent.url, href = %href, error = %e, "dropping unparseable link")
            }
        }
    }
    items
}
