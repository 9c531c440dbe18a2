// src/error.rs

//! Unified error handling for the search engine.

use thiserror::Error;

/// Result type alias for search engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database operation failed
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Document language is not in the supported set
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Fetch failed with a transport error or non-200 status
    #[error("fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// HTML parsing or extraction failed
    #[error("parse error: {0}")]
    Parse(String),

    /// A document with the same content hash already exists in this domain
    #[error("duplicate content for domain {domain} (hash {hash})")]
    DuplicateContent { domain: String, hash: String },

    /// Query could not be tokenized into any terms
    #[error("bad query: {0}")]
    BadQuery(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation aborted by cooperative shutdown
    #[error("operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Create a fetch error with the offending URL.
    pub fn fetch(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a bad-query error.
    pub fn bad_query(message: impl Into<String>) -> Self {
        Self::BadQuery(message.into())
    }

    /// True if the error is a Postgres unique-constraint violation.
    ///
    /// Frontier inserts racing on `url_norm` hit this; callers swallow it
    /// instead of failing the pipeline.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Db(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }
}
