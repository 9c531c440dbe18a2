// src/store/mod.rs

//! Persistent storage for the search engine.
//!
//! Wraps a Postgres connection pool and exposes the SQL operations the
//! crawler, ranker, and query server share. Statement helpers take
//! `impl PgExecutor<'_>` so each one runs against either a pooled
//! connection or an in-flight transaction.

pub mod doc;
pub mod frontier;
pub mod index;
pub mod posting;
pub mod rank;
pub mod search;
pub mod term;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::Result;

/// The database connection pool shared by every component.
#[derive(Debug, Clone)]
pub struct Store {
    pub pool: PgPool,
}

impl Store {
    /// Connect to Postgres and apply pending migrations.
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(dsn)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool. The caller is responsible for migrations.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
