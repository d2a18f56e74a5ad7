//! Crawler module for fetching and extracting results pages
//!
//! This module contains the core crawling logic, including:
//! - Field parsing for the byline, footer and title of a result
//! - Record extraction from result blocks
//! - HTTP fetching with jittered delays and identity rotation
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
pub mod fields;
mod parser;
mod progress;
mod scheduler;

pub use coordinator::{run_crawl, CancelFlag, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, FetchSettings, Fetcher, PageFetchResult, PageSource};
pub use parser::{ExtractError, RecordExtractor};
pub use progress::{LogProgress, NullProgress, Progress};
pub use scheduler::{FixedPacer, Pacer, RandomPacer};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the base query URL
/// 2. Build the HTTP client and pacers
/// 3. Fetch pages until the target is reached or a page stops the crawl
///
/// Delays and identities are drawn from entropy; use [`run_crawl`] for a
/// seeded run.
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `cancel` - Flag checked between pages
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran, possibly stopping early
/// * `Err(HarvestError)` - The crawl could not be set up
pub async fn crawl(config: &Config, cancel: CancelFlag) -> Result<CrawlReport, HarvestError> {
    run_crawl(config, None, cancel).await
}
