//! Progress reporting for crawls
//!
//! The coordinator reports what it does through [`Progress`]; observers only
//! watch and never influence the crawl.

/// Observer of crawl progress
///
/// All methods default to doing nothing.
pub trait Progress: Send {
    /// Called once before the first page with the record target and page budget
    fn begin(&mut self, _target: usize, _pages: usize) {}

    /// Called before each page request with the zero-based page index
    fn page_started(&mut self, _page: usize, _pages: usize) {}

    /// Called after a page yielded records
    fn advance(&mut self, _new_records: usize, _collected: usize, _target: usize) {}

    /// Called at the end, whatever stopped the crawl
    fn finish(&mut self, _collected: usize) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Reports progress through `tracing` at info level
#[derive(Debug, Default)]
pub struct LogProgress {
    target: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, target: usize, pages: usize) {
        self.target = target;
        tracing::info!("Collecting {} records over at most {} pages", target, pages);
    }

    fn page_started(&mut self, page: usize, pages: usize) {
        tracing::info!("Scraping page {}/{}", page + 1, pages);
    }

    fn advance(&mut self, new_records: usize, collected: usize, target: usize) {
        tracing::info!(
            "+{} records: {} of {} collected",
            new_records,
            collected.min(target),
            target
        );
    }

    fn finish(&mut self, collected: usize) {
        tracing::info!("Collected {} of {} records", collected, self.target);
    }
}
