// src/bin/crawler.rs

//! Crawl-and-index CLI.
//!
//! Opens the store, builds the pipeline from the configured seed list,
//! and runs for the configured duration or until SIGINT/SIGTERM.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use seekr::pipeline::Pipeline;
use seekr::store::doc;
use seekr::store::frontier::{self, FrontierStatus};
use seekr::{Config, Result, Store};

#[derive(Parser, Debug)]
#[command(name = "crawler", about = "Crawl seed URLs and build the search index")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Override the configured crawl duration, in seconds
    #[arg(long)]
    duration_secs: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load_or_default(&cli.config);
    if let Some(secs) = cli.duration_secs {
        config.crawler.crawl_duration_secs = secs;
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "crawler failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    let store = Store::connect(&config.database_url(), config.database.max_connections).await?;

    let cancel = CancellationToken::new();
    let pipeline = Pipeline::new(store.clone(), &config.crawler, cancel.clone()).await?;

    // Stop on signal or when the crawl window elapses, whichever first.
    let stopper = cancel.clone();
    let duration = config.crawler.crawl_duration();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_signal() => info!("received shutdown signal"),
            _ = tokio::time::sleep(duration) => info!("crawl duration elapsed"),
        }
        stopper.cancel();
    });

    info!(
        seeds = config.crawler.seeds.len(),
        duration_secs = duration.as_secs(),
        "starting crawl"
    );
    pipeline.run().await;

    match crawl_summary(&store).await {
        Ok((indexed, failed, remaining)) => {
            info!(indexed, failed, remaining, "crawl summary")
        }
        Err(e) => warn!(error = %e, "failed to read crawl summary"),
    }

    store.close().await;
    info!("crawler stopped");
    Ok(())
}

async fn crawl_summary(store: &Store) -> Result<(i64, i64, i64)> {
    let indexed = doc::count_indexed(&store.pool).await?;
    let failed = frontier::count_by_status(&store.pool, FrontierStatus::Failed).await?;
    let remaining = frontier::count_by_status(&store.pool, FrontierStatus::Unvisited).await?;
    Ok((indexed, failed, remaining))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
