use crate::query::{SearchQuery, DEFAULT_BASE_URL};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Browser identities rotated per request when the config gives no pool
pub const DEFAULT_IDENTITIES: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Main configuration structure for Scholar-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub query: QueryConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds the search query described by the `[query]` table
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery {
            term: self.query.term.clone(),
            year_low: self.query.year_low,
            year_high: self.query.year_high,
            language: self.query.language.clone(),
        }
    }

    /// Resolves the CSV output path, defaulting to `<term>_google_scholar_results.csv`
    pub fn csv_path(&self) -> PathBuf {
        match &self.output.csv_path {
            Some(path) => PathBuf::from(path),
            None => {
                let stem: String = self
                    .query
                    .term
                    .trim()
                    .chars()
                    .map(|c| if c.is_alphanumeric() { c } else { '_' })
                    .collect();
                PathBuf::from(format!("{}_google_scholar_results.csv", stem))
            }
        }
    }
}

/// What to search for
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// Free-text search term
    pub term: String,

    /// Lower publication-year bound (inclusive)
    #[serde(rename = "year-low", default)]
    pub year_low: Option<u16>,

    /// Upper publication-year bound (inclusive)
    #[serde(rename = "year-high", default)]
    pub year_high: Option<u16>,

    /// Interface language of the results page
    #[serde(default = "default_language")]
    pub language: String,

    /// Search endpoint
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

/// Crawl pacing and size
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of records to collect
    #[serde(rename = "target-count")]
    pub target_count: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Jitter applied before every request (milliseconds)
    #[serde(rename = "request-delay", default)]
    pub request_delay: DelayRange,

    /// Jitter applied between pages (milliseconds)
    #[serde(rename = "page-delay", default)]
    pub page_delay: DelayRange,

    /// Optional proxy for all requests
    #[serde(default)]
    pub proxy: Option<String>,
}

impl CrawlerConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Inclusive millisecond range a jittered delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    /// A range that always yields no delay
    pub const ZERO: DelayRange = DelayRange { min: 0, max: 0 };

    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min: 5_000,
            max: 10_000,
        }
    }
}

/// Client identity rotation
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// User-Agent strings picked uniformly per request
    #[serde(default = "default_identity_pool")]
    pub pool: Vec<String>,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language", default)]
    pub accept_language: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            pool: default_identity_pool(),
            accept_language: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV file
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_identity_pool() -> Vec<String> {
    DEFAULT_IDENTITIES.iter().map(|s| s.to_string()).collect()
}
