//! Output module for delivering harvested records
//!
//! This module handles:
//! - Ordering the collected records for delivery
//! - Writing them to a tabular sink
//!
//! The degraded path ([`finalize_or_raw`]) always delivers what was collected,
//! sorted when possible.

mod csv_sink;
mod finalize;
mod traits;

pub use csv_sink::CsvSink;
pub use finalize::{check_years, finalize, finalize_or_raw, sort_records, FinalizeError, Finalized};
pub use traits::{OutputError, OutputResult, RecordSink};

use crate::record::Record;
use crate::Result;
use std::path::Path;

/// Finalizes records and writes them to a CSV file
///
/// # Arguments
///
/// * `records` - The collected records, in extraction order
/// * `limit` - Keep at most this many records
/// * `path` - Destination file
///
/// # Returns
///
/// * `Ok(Finalized)` - What was written, and whether it is sorted
/// * `Err(HarvestError)` - The file could not be written
pub fn write_csv(records: Vec<Record>, limit: Option<usize>, path: &Path) -> Result<Finalized> {
    let finalized = finalize_or_raw(records, limit);

    let mut sink = CsvSink::create(path)?;
    let written = sink.write_records(&finalized.records)?;
    sink.into_inner()?;

    tracing::info!("Wrote {} records to {}", written, path.display());
    Ok(finalized)
}
