// src/bin/ranker.rs

//! Periodic ranking CLI.
//!
//! Recomputes df/idf/norm at a fixed interval until signaled.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use seekr::rank::{Ranker, RankerOptions};
use seekr::{Config, Result, Store};

#[derive(Parser, Debug)]
#[command(name = "ranker", about = "Periodically recompute ranking statistics")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);

    if let Err(e) = run(config).await {
        error!(error = %e, "ranker failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    let store = Store::connect(&config.database_url(), config.database.max_connections).await?;

    let options = RankerOptions {
        interval: config.ranker.interval(),
        max_retries: config.ranker.max_retries,
        ..RankerOptions::default()
    };
    let ranker = Ranker::with_options(store.clone(), options);

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        stopper.cancel();
    });

    info!(interval_secs = config.ranker.interval_secs, "starting ranking service");
    ranker.run(cancel).await;

    store.close().await;
    info!("ranking service stopped");
    Ok(())
}
