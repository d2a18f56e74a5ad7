//! Search query construction
//!
//! Builds the base results URL from a term and optional year bounds, and the
//! per-page URLs the crawler walks through via the `start` offset.

use crate::{QueryError, QueryResult};
use url::Url;

/// Default search endpoint
pub const DEFAULT_BASE_URL: &str = "https://scholar.google.com/scholar";

/// Results per page, fixed by the source
pub const PAGE_SIZE: usize = 10;

/// Name of the pagination offset parameter
const START_PARAM: &str = "start";

/// A free-text search with optional publication-year bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub year_low: Option<u16>,
    pub year_high: Option<u16>,
    pub language: String,
}

impl SearchQuery {
    /// Creates an English-language query without year bounds
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            year_low: None,
            year_high: None,
            language: "en".to_string(),
        }
    }

    /// Restricts results to publications from `low` onwards
    pub fn since(mut self, low: u16) -> Self {
        self.year_low = Some(low);
        self
    }

    /// Restricts results to publications up to `high`
    pub fn until(mut self, high: u16) -> Self {
        self.year_high = Some(high);
        self
    }

    /// Builds the base query URL against the given endpoint
    ///
    /// # Example
    ///
    /// ```
    /// use scholar_harvest::query::{SearchQuery, DEFAULT_BASE_URL};
    ///
    /// let url = SearchQuery::new("China").since(2019).to_url(DEFAULT_BASE_URL).unwrap();
    /// assert!(url.as_str().contains("as_ylo=2019"));
    /// ```
    pub fn to_url(&self, base_url: &str) -> QueryResult<Url> {
        let term = self.term.trim();
        if term.is_empty() {
            return Err(QueryError::EmptyTerm);
        }

        if let (Some(low), Some(high)) = (self.year_low, self.year_high) {
            if low > high {
                return Err(QueryError::InvalidYearRange { low, high });
            }
        }

        let mut url = Url::parse(base_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", term);
            pairs.append_pair("hl", &self.language);
            pairs.append_pair("as_sdt", "0,5");
            if let Some(low) = self.year_low {
                pairs.append_pair("as_ylo", &low.to_string());
            }
            if let Some(high) = self.year_high {
                pairs.append_pair("as_yhi", &high.to_string());
            }
        }

        Ok(url)
    }
}

/// Number of pages needed to reach `target_count` records
pub fn page_count(target_count: usize) -> usize {
    target_count.div_ceil(PAGE_SIZE)
}

/// Builds the URL of a zero-based results page
///
/// Any `start` pair already present on the base query is replaced.
pub fn page_url(base_query: &Url, page: usize) -> Url {
    let retained: Vec<(String, String)> = base_query
        .query_pairs()
        .filter(|(key, _)| key != START_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base_query.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(START_PARAM, &(page * PAGE_SIZE).to_string());
    url
}
