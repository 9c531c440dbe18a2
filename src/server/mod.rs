// src/server/mod.rs

//! The HTTP query server.
//!
//! Serves the search API plus a small static front end. Shutdown is
//! cooperative: the router drains on cancellation, bounded by the
//! configured deadline.

pub mod handlers;

use std::path::PathBuf;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::store::Store;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub assets_dir: PathBuf,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_page))
        .route("/query", post(handlers::query))
        .route("/health", get(handlers::health))
        .route("/static/*path", get(handlers::static_asset))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until cancelled, then drain within the deadline.
pub async fn serve(store: Store, config: &ServerConfig, cancel: CancellationToken) -> Result<()> {
    let state = AppState {
        store,
        assets_dir: PathBuf::from(&config.assets_dir),
    };
    let app = router(state);

    let listener = TcpListener::bind(&config.bind).await?;
    info!(addr = %config.bind, "search server listening");

    let shutdown = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
    });

    tokio::select! {
        result = &mut server => {
            result.map_err(std::io::Error::other)??;
        }
        _ = cancel.cancelled() => {
            match tokio::time::timeout(config.shutdown_timeout(), &mut server).await {
                Ok(result) => result.map_err(std::io::Error::other)??,
                Err(_) => warn!("graceful shutdown deadline exceeded, aborting"),
            }
        }
    }

    Ok(())
}
