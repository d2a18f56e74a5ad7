//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the page loop that drives the fetcher across result
//! pages:
//! - Building each page URL from the base query
//! - Accumulating records and reporting progress
//! - Stopping on the target, on the first non-success page, or on cancellation
//! - Pacing between pages

use crate::config::Config;
use crate::crawler::fetcher::{FetchSettings, Fetcher, PageFetchResult, PageSource};
use crate::crawler::progress::{LogProgress, Progress};
use crate::crawler::scheduler::{Pacer, RandomPacer};
use crate::query::page_url;
use crate::record::Record;
use crate::state::{CrawlState, StopReason};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use url::Url;

/// Shared flag a caller sets to stop a crawl between pages
///
/// A request already in flight is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a completed crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// At most `target_count` records, in extraction order
    pub records: Vec<Record>,

    /// Number of page requests issued
    pub pages_issued: usize,

    /// What ended the crawl
    pub stop_reason: StopReason,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Wall-clock duration of the crawl
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Main crawler coordinator structure
///
/// Pages are fetched strictly one after another. A coordinator owns its source,
/// pacer and state, so separate coordinators crawl in isolation.
pub struct Coordinator<S: PageSource, P: Pacer = RandomPacer> {
    source: S,
    pacer: P,
    progress: Box<dyn Progress>,
    cancel: CancelFlag,
}

impl<S: PageSource, P: Pacer> Coordinator<S, P> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `source` - Where pages are fetched from
    /// * `pacer` - Supplies the delay between pages
    pub fn new(source: S, pacer: P) -> Self {
        Self {
            source,
            pacer,
            progress: Box::new(LogProgress::default()),
            cancel: CancelFlag::new(),
        }
    }

    /// Replaces the progress observer
    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    /// Uses a caller-held cancellation flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns a handle that cancels this coordinator's crawls
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Crawls result pages until `target_count` records are collected
    ///
    /// # Page Loop
    ///
    /// For each page in `0..ceil(target_count / 10)`:
    /// 1. Build the page URL (`start = page * 10`)
    /// 2. Fetch it; on success append its records
    /// 3. Stop if the page was not a success or the target is reached
    /// 4. Otherwise wait the page delay
    ///
    /// Never fails: whatever was collected before a stop is returned, truncated
    /// to `target_count`.
    pub async fn crawl(&mut self, base_query: &Url, target_count: usize) -> CrawlReport {
        let started_at = Utc::now();
        let mut state = CrawlState::new(target_count);
        let pages = state.page_count();

        tracing::info!(
            "Starting crawl of {} for {} records ({} pages)",
            base_query,
            target_count,
            pages
        );
        self.progress.begin(target_count, pages);

        for page in 0..pages {
            if self.cancel.is_cancelled() {
                state.stop(StopReason::Cancelled);
                break;
            }

            let url = page_url(base_query, page);
            state.record_page_issued();
            self.progress.page_started(page, pages);
            tracing::debug!("Fetching page {} ({})", page + 1, url);

            let outcome = self.source.fetch_page(&url).await;
            tracing::debug!("Page {} outcome: {}", page + 1, outcome.label());

            match outcome {
                PageFetchResult::Success(records) => {
                    let added = state.extend(records);
                    self.progress
                        .advance(added, state.collected(), target_count);
                }
                PageFetchResult::Empty => {
                    tracing::info!("Page {} returned no records, stopping", page + 1);
                    state.stop(StopReason::SourceExhausted);
                }
                PageFetchResult::TransientError { reason, status } => {
                    tracing::warn!(
                        "Page {} failed ({}, status {:?}), stopping without retry",
                        page + 1,
                        reason,
                        status
                    );
                    state.stop(StopReason::PageFailed(reason));
                }
                PageFetchResult::FatalError { reason } => {
                    tracing::error!("Page {} is unusable ({}), stopping", page + 1, reason);
                    state.stop(StopReason::PageFailed(reason));
                }
            }

            if state.is_terminated() {
                break;
            }

            if state.target_reached() {
                state.stop(StopReason::TargetReached);
                break;
            }

            if self.cancel.is_cancelled() {
                state.stop(StopReason::Cancelled);
                break;
            }

            if page + 1 < pages {
                let delay = self.pacer.page_delay();
                tracing::debug!("Waiting {:?} before the next page", delay);
                tokio::time::sleep(delay).await;
            }
        }

        let pages_issued = state.pages_issued();
        let (records, stop_reason) = state.into_records();
        self.progress.finish(records.len());

        let finished_at = Utc::now();
        tracing::info!(
            "Crawl finished: {} records from {} pages in {}s ({})",
            records.len(),
            pages_issued,
            (finished_at - started_at).num_seconds(),
            stop_reason
        );

        CrawlReport {
            records,
            pages_issued,
            stop_reason,
            started_at,
            finished_at,
        }
    }
}

/// Runs a complete crawl from configuration
///
/// Builds the base query, the HTTP fetcher and the pacers, then crawls until
/// `target-count` records are collected or the crawl stops early.
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `seed` - Fixed seed for delays and identities, or None for entropy
/// * `cancel` - Flag checked between pages
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran (possibly stopping early)
/// * `Err(HarvestError)` - The query or HTTP client could not be set up
///
/// # Example
///
/// ```no_run
/// use scholar_harvest::config::load_config;
/// use scholar_harvest::crawler::{run_crawl, CancelFlag};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_crawl(&config, None, CancelFlag::new()).await?;
/// println!("{} records", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    seed: Option<u64>,
    cancel: CancelFlag,
) -> Result<CrawlReport, HarvestError> {
    let base_query = config.search_query().to_url(&config.query.base_url)?;

    let settings = FetchSettings::from_config(config);
    let fetcher = Fetcher::new(&settings, RandomPacer::from_config(config, seed))?;

    // Separate stream for page delays so the two draws stay independent
    let page_pacer = RandomPacer::from_config(config, seed.map(|s| s.wrapping_add(1)));

    let mut coordinator = Coordinator::new(fetcher, page_pacer).with_cancel_flag(cancel);
    Ok(coordinator
        .crawl(&base_query, config.crawler.target_count)
        .await)
}
