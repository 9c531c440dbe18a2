// src/pipeline/fetcher.rs

//! The fetch stage: HTTP GET with the crawler's User-Agent.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;
use crate::error::{AppError, Result};
use crate::pipeline::driver::CrawlerMessage;
use crate::pipeline::mark_failed;
use crate::store::frontier::FrontierItem;
use crate::store::Store;

/// A fetched page on its way to the processor.
#[derive(Debug)]
pub struct ProcessorMessage {
    pub item: FrontierItem,
    pub body: String,
}

/// Fetches pages for the processor, marking unreachable items `Failed`.
pub struct Fetcher {
    client: Client,
    store: Store,
    input: mpsc::Receiver<CrawlerMessage>,
    out: mpsc::Sender<ProcessorMessage>,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(
        store: Store,
        config: &CrawlerConfig,
        input: mpsc::Receiver<CrawlerMessage>,
        out: mpsc::Sender<ProcessorMessage>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        // Every outbound request identifies the crawler.
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            store,
            input,
            out,
            cancel,
        })
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("fetcher cancelled");
                    return;
                }
                msg = self.input.recv() => {
                    let Some(CrawlerMessage { item }) = msg else {
                        debug!("crawl channel closed, stopping fetcher");
                        self.cancel.cancel();
                        return;
                    };
                    self.handle_item(item).await;
                }
            }
        }
    }

    async fn handle_item(&mut self, item: FrontierItem) {
        info!(url = %item.url, "fetching");
        let body = match self.fetch(&item.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %item.url, error = %e, "fetch failed");
                mark_failed(&self.store, &item.url_norm).await;
                return;
            }
        };

        tokio::select! {
            _ = self.cancel.cancelled() => {}
            sent = self.out.send(ProcessorMessage { item, body }) => {
                if sent.is_err() {
                    debug!("processor channel closed, stopping fetcher");
                    self.cancel.cancel();
                }
            }
        }
    }

    /// Perform a single GET, accepting only `200 OK`.
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(AppError::fetch(url, format!("status {}", response.status())));
        }
        Ok(response.text().await?)
    }
}
