//! Page-Harvest: a bulk concurrent page fetcher
//!
//! This crate fetches a fixed list of URLs in sequential chunks, runs the
//! pages of each chunk concurrently through a shared (optionally proxied)
//! HTTP session, and streams every successful page into a JSON array file.
//! Individual page failures are logged and skipped; they never abort a batch.

pub mod config;
pub mod crawler;
pub mod input;
pub mod output;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Page-Harvest operations
///
/// Every variant is fatal to a run. Per-page failures are reported through
/// [`crawler::FetchError`] and never reach this type.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read URL list {path}: {source}")]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize record for {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Page-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, harvest_urls, Coordinator, FetchError, FetchResult};
pub use output::{HarvestStats, JsonArraySink};
