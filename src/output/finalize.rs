//! Result finalization
//!
//! Orders the collected records for delivery: newest year first (records
//! without a year last), then most cited first. The sort is stable, so records
//! that tie keep their extraction order.

use crate::record::{Record, MAX_YEAR, MIN_YEAR};
use std::cmp::Ordering;
use thiserror::Error;

/// Raised when a record cannot be ordered safely
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinalizeError {
    #[error("Record {index} ('{title}') has year {year} outside {min}..={max}", min = MIN_YEAR, max = MAX_YEAR)]
    YearOutOfRange {
        index: usize,
        title: String,
        year: u16,
    },
}

/// Records ready for delivery
#[derive(Debug, Clone)]
pub struct Finalized {
    pub records: Vec<Record>,

    /// False when finalization failed and the records are in extraction order
    pub sorted: bool,
}

/// Delivery order of two records
fn delivery_order(a: &Record, b: &Record) -> Ordering {
    // `None < Some(_)`, so descending puts missing years last
    b.year
        .cmp(&a.year)
        .then_with(|| b.citations.cmp(&a.citations))
}

/// Sorts records in place into delivery order
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(delivery_order);
}

/// Checks every present year lies in the accepted range
pub fn check_years(records: &[Record]) -> Result<(), FinalizeError> {
    match records.iter().enumerate().find(|(_, r)| !r.has_valid_year()) {
        Some((index, record)) => Err(FinalizeError::YearOutOfRange {
            index,
            title: record.title.clone(),
            year: record.year.unwrap_or_default(),
        }),
        None => Ok(()),
    }
}

/// Sorts records into delivery order and optionally truncates them
///
/// Running it again on its own output returns the same sequence.
///
/// # Arguments
///
/// * `records` - The collected records
/// * `limit` - Keep at most this many records after sorting
///
/// # Returns
///
/// * `Ok(Vec<Record>)` - Sorted (and truncated) records
/// * `Err(FinalizeError)` - A record carries an impossible year
///
/// # Example
///
/// ```
/// use scholar_harvest::output::finalize;
/// use scholar_harvest::Record;
///
/// let records = vec![
///     Record { year: Some(2019), ..Record::default() },
///     Record { year: Some(2021), ..Record::default() },
/// ];
/// let sorted = finalize(records, None).unwrap();
/// assert_eq!(sorted[0].year, Some(2021));
/// ```
pub fn finalize(mut records: Vec<Record>, limit: Option<usize>) -> Result<Vec<Record>, FinalizeError> {
    check_years(&records)?;
    sort_records(&mut records);
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    Ok(records)
}

/// Finalizes records, falling back to extraction order on failure
///
/// The collected data is always delivered; a failure is logged and reported
/// through [`Finalized::sorted`].
pub fn finalize_or_raw(mut records: Vec<Record>, limit: Option<usize>) -> Finalized {
    let sorted = match check_years(&records) {
        Ok(()) => {
            sort_records(&mut records);
            true
        }
        Err(e) => {
            tracing::warn!("Could not sort results ({}), writing them unsorted", e);
            false
        }
    };

    if let Some(limit) = limit {
        records.truncate(limit);
    }
    Finalized { records, sorted }
}
