// src/bin/server.rs

//! HTTP query server CLI.
//!
//! Binds the configured address and serves the search API until
//! signaled, then drains connections within the shutdown deadline.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use seekr::{server, Config, Result, Store};

#[derive(Parser, Debug)]
#[command(name = "server", about = "Serve the search API and front end")]
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
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<()> {
    let store = Store::connect(&config.database_url(), config.database.max_connections).await?;

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        stopper.cancel();
    });

    server::serve(store.clone(), &config.server, cancel).await?;

    store.close().await;
    info!("server stopped gracefully");
    Ok(())
}
