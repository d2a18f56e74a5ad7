//! CSV output
//!
//! Writes the finalized dataset as a delimited table with a header row.
//! Quoting and escaping are left to the `csv` writer.

use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::record::Record;
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Writes records as CSV rows
pub struct CsvSink<W: Write> {
    writer: Writer<W>,
    header_written: bool,
}

impl CsvSink<File> {
    /// Creates (or truncates) a CSV file
    ///
    /// # Arguments
    ///
    /// * `path` - Where the table is written
    pub fn create(path: &Path) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps any writer
    pub fn from_writer(inner: W) -> Self {
        // The header is written explicitly so it is present even with no rows
        let writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        Self {
            writer,
            header_written: false,
        }
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer.into_inner().map_err(|e| {
            OutputError::Io(io::Error::new(e.error().kind(), e.error().to_string()))
        })
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_records(&mut self, records: &[Record]) -> OutputResult<usize> {
        if !self.header_written {
            self.writer.write_record(Record::COLUMNS)?;
            self.header_written = true;
        }
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;

        tracing::debug!("Wrote {} CSV rows", records.len());
        Ok(records.len())
    }
}
