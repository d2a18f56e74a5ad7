//! Per-crawl state
//!
//! Tracks the page budget, the pages requested so far and the records
//! accumulated across pages, and records why the crawl ended. The first stop
//! reason recorded is the one reported.

use crate::query::page_count;
use crate::record::Record;
use std::fmt;

/// Why a crawl stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Enough records were collected
    TargetReached,

    /// Every page in the budget was requested
    PagesExhausted,

    /// A page came back without records
    SourceExhausted,

    /// A page failed (network, status or content); the page is not retried
    PageFailed(String),

    /// The caller cancelled between pages
    Cancelled,
}

impl StopReason {
    /// Returns true if the crawl ended because of a failed page
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PageFailed(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached => write!(f, "target reached"),
            Self::PagesExhausted => write!(f, "page budget exhausted"),
            Self::SourceExhausted => write!(f, "source returned no more records"),
            Self::PageFailed(reason) => write!(f, "page failed: {}", reason),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// State of a single crawl invocation
///
/// Owned by the coordinator for the duration of one crawl and never shared.
#[derive(Debug, Clone)]
pub struct CrawlState {
    target_count: usize,
    page_count: usize,
    pages_issued: usize,
    records: Vec<Record>,
    stop_reason: Option<StopReason>,
}

impl CrawlState {
    /// Creates the state for a crawl aiming at `target_count` records
    pub fn new(target_count: usize) -> Self {
        Self {
            target_count,
            page_count: page_count(target_count),
            pages_issued: 0,
            records: Vec::new(),
            stop_reason: None,
        }
    }

    /// Page budget: enough pages to reach the target
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn pages_issued(&self) -> usize {
        self.pages_issued
    }

    /// Records a page request
    pub fn record_page_issued(&mut self) {
        self.pages_issued += 1;
    }

    /// Appends a page's records, returning how many were added
    pub fn extend(&mut self, records: Vec<Record>) -> usize {
        let added = records.len();
        self.records.extend(records);
        added
    }

    /// Number of records accumulated so far (may exceed the target)
    pub fn collected(&self) -> usize {
        self.records.len()
    }

    pub fn target_reached(&self) -> bool {
        self.records.len() >= self.target_count
    }

    /// Terminates the crawl; the first reason wins
    pub fn stop(&mut self, reason: StopReason) {
        if self.stop_reason.is_none() {
            self.stop_reason = Some(reason);
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.stop_reason.is_some()
    }

    /// Consumes the state, returning exactly `target_count` records at most
    ///
    /// A crawl that was never stopped explicitly ran through its page budget.
    pub fn into_records(self) -> (Vec<Record>, StopReason) {
        let mut records = self.records;
        records.truncate(self.target_count);
        let reason = self.stop_reason.unwrap_or(StopReason::PagesExhausted);
        (records, reason)
    }
}
