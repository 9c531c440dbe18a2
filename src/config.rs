// src/config.rs

//! Configuration loading for the crawler, ranker, and query server.
//!
//! Settings live in a single TOML file shared by all three binaries.
//! The database DSN can be overridden with the `DATABASE_URL` environment
//! variable, which takes precedence over the file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::Result;
use crate::extract::Language;

/// Root configuration structure.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Database connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Crawler behavior settings.
#[derive(Debug, Deserialize, Clone)]
pub struct CrawlerConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Seed URLs inserted into the frontier at startup
    pub seeds: Vec<String>,
    /// ISO 639 codes of languages accepted by the extractor
    pub languages: Vec<String>,
    /// How long a crawl run lasts before shutting down
    pub crawl_duration_secs: u64,
    /// Capacity of the frontier prefetch buffer
    pub frontier_buffer: usize,
}

/// Ranking service settings.
#[derive(Debug, Deserialize, Clone)]
pub struct RankerConfig {
    pub interval_secs: u64,
    pub max_retries: u32,
}

/// HTTP server settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub assets_dir: String,
    pub shutdown_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost/seekr".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: "seekr-bot/0.1 (+mailto:ops@seekr.example)".to_string(),
            timeout_secs: 30,
            seeds: Vec::new(),
            languages: vec!["en".to_string()],
            crawl_duration_secs: 180,
            frontier_buffer: 500,
        }
    }
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            max_retries: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            assets_dir: "assets/web".to_string(),
            shutdown_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }

    /// The database DSN, honoring the `DATABASE_URL` override.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.database.url.clone())
    }
}

impl CrawlerConfig {
    /// Resolve the configured ISO codes into the supported-language set.
    ///
    /// Unrecognized codes are skipped with a warning.
    pub fn supported_languages(&self) -> Vec<Language> {
        let mut langs = Vec::new();
        for code in &self.languages {
            match Language::from_iso_code(code) {
                Some(lang) => {
                    if !langs.contains(&lang) {
                        langs.push(lang);
                    }
                }
                None => warn!(code = %code, "unrecognized language code in config, skipping"),
            }
        }
        langs
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn crawl_duration(&self) -> Duration {
        Duration::from_secs(self.crawl_duration_secs)
    }
}

impl RankerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
