//! Output sink traits and errors

use crate::record::Record;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for finalized records
///
/// A sink receives the whole dataset at once, in the order it should be
/// written.
pub trait RecordSink {
    /// Writes the records, returning how many rows were written
    ///
    /// # Arguments
    ///
    /// * `records` - The finalized records
    fn write_records(&mut self, records: &[Record]) -> OutputResult<usize>;
}
