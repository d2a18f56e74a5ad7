//! The bibliographic record produced by the extractor

use serde::Serialize;

/// Title used when a result block has no title container
pub const UNTITLED: &str = "Untitled";

/// Earliest publication year accepted from the source
pub const MIN_YEAR: u16 = 1900;

/// Latest publication year accepted from the source
pub const MAX_YEAR: u16 = 2024;

/// One bibliographic entry extracted from a result block
///
/// Field order is the column order of the tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Cleaned title, or [`UNTITLED`]
    pub title: String,

    /// Link target of the title, if any
    pub url: Option<String>,

    /// Author segment of the byline (may be empty)
    pub authors: String,

    /// Publication year, always within [`MIN_YEAR`]..=[`MAX_YEAR`] when present
    pub year: Option<u16>,

    /// Snippet text (may be empty)
    pub description: String,

    /// Citation count reported by the source
    pub citations: u32,
}

impl Record {
    /// Column names in output order
    pub const COLUMNS: [&'static str; 6] =
        ["title", "url", "authors", "year", "description", "citations"];

    /// Returns true if the year is absent or inside the accepted range
    pub fn has_valid_year(&self) -> bool {
        self.year
            .map_or(true, |year| (MIN_YEAR..=MAX_YEAR).contains(&year))
    }
}

impl Default for Record {
    fn default() -> Self {
        Self {
            title: UNTITLED.to_string(),
            url: None,
            authors: String::new(),
            year: None,
            description: String::new(),
            citations: 0,
        }
    }
}
