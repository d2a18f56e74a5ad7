//! Scholar-Harvest: a paced bibliographic results harvester
//!
//! This crate crawls a paginated scholarly search-results source one page at a
//! time, extracts bibliographic records from each page's result blocks, and
//! emits a sorted tabular dataset.

pub mod config;
pub mod crawler;
pub mod output;
pub mod query;
pub mod record;
pub mod state;

use thiserror::Error;

/// Main error type for Scholar-Harvest operations
///
/// The crawl loop itself never returns an error; these cover setup (config,
/// client construction, query building) and delivery to the sink.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Extractor error: {0}")]
    Extract(#[from] crawler::ExtractError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
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

/// Search query errors
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Search term cannot be empty")]
    EmptyTerm,

    #[error("Invalid year range: {low} > {high}")]
    InvalidYearRange { low: u16, high: u16 },

    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] ::url::ParseError),
}

/// Result type alias for Scholar-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for query building
pub type QueryResult<T> = std::result::Result<T, QueryError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CancelFlag, Coordinator, CrawlReport, PageFetchResult};
pub use query::SearchQuery;
pub use record::Record;
pub use state::{CrawlState, StopReason};
