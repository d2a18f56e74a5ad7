//! Field parsing for result blocks
//!
//! Pure functions that turn raw text fragments from a result block into typed
//! values. None of them fail: a fragment that cannot be parsed yields the
//! field's default.

use crate::record::{MAX_YEAR, MIN_YEAR};
use regex::Regex;
use std::sync::LazyLock;

/// Phrase marking the citation link
pub const CITED_BY: &str = "Cited by";

/// Query-string marker of a citation listing URL
pub const CITATION_QUERY_MARKER: &str = "cites=";

/// Separators between the author, venue and publisher parts of a byline
const SEGMENT_DELIMITERS: &[char] = &['…', '-', '–', '—'];

/// A `19xx`/`20xx` token not followed by another digit
#[allow(clippy::expect_used)]
static YEAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:19|20)[0-9]{2})(?:[^0-9]|$)").expect("year regex is valid")
});

/// Longest bracketed type marker stripped from titles (e.g. `[CITATION]`)
const MAX_MARKER_LEN: usize = 10;

/// An inline link from a result block's footer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FooterLink {
    /// Visible anchor text
    pub text: String,

    /// Raw `href` attribute
    pub href: Option<String>,
}

impl FooterLink {
    pub fn new(text: impl Into<String>, href: Option<&str>) -> Self {
        Self {
            text: text.into(),
            href: href.map(str::to_string),
        }
    }
}

/// Finds the first publication year in free text
///
/// A candidate is a 4-digit token starting with `19` or `20` that is not
/// immediately followed by another digit. Candidates outside
/// [`MIN_YEAR`]..=[`MAX_YEAR`] are skipped and the scan continues.
///
/// # Example
///
/// ```
/// use scholar_harvest::crawler::fields::extract_year;
///
/// assert_eq!(extract_year("Published in 1999 and cited in 2021"), Some(1999));
/// assert_eq!(extract_year("no year here"), None);
/// ```
pub fn extract_year(text: &str) -> Option<u16> {
    YEAR_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u16>().ok())
        .find(|year| (MIN_YEAR..=MAX_YEAR).contains(year))
}

/// Splits a byline into its authors string and publication year
///
/// The byline is split on ellipses and dashes; empty segments are dropped.
/// The first segment is the authors string, and the year is the first one
/// found scanning the segments in order.
///
/// # Example
///
/// ```
/// use scholar_harvest::crawler::fields::parse_author_block;
///
/// let (authors, year) = parse_author_block("J. Smith - 2019 - Journal");
/// assert_eq!(authors, "J. Smith");
/// assert_eq!(year, Some(2019));
/// ```
pub fn parse_author_block(text: &str) -> (String, Option<u16>) {
    let segments: Vec<&str> = text
        .split(SEGMENT_DELIMITERS)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    let authors = segments
        .first()
        .map(|segment| segment.to_string())
        .unwrap_or_default();
    let year = segments.iter().find_map(|segment| extract_year(segment));

    (authors, year)
}

/// Reads the citation count from a block's footer links
///
/// Best-effort over inconsistent markup. The link is chosen by three
/// fallbacks, in this order:
///
/// 1. visible text containing `"Cited by"`
/// 2. target URL containing the `cites=` marker
/// 3. visible text containing `"cited by"` ignoring case and whitespace form
///
/// The digits of the chosen link's text form the count. No match, or no
/// digits, gives 0.
pub fn extract_citation_count(links: &[FooterLink]) -> u32 {
    let matched = links
        .iter()
        .find(|link| link.text.contains(CITED_BY))
        .or_else(|| {
            links.iter().find(|link| {
                link.href
                    .as_deref()
                    .is_some_and(|href| href.contains(CITATION_QUERY_MARKER))
            })
        })
        .or_else(|| links.iter().find(|link| mentions_cited_by(&link.text)));

    match matched {
        Some(link) => digits_to_count(&link.text),
        None => 0,
    }
}

fn mentions_cited_by(text: &str) -> bool {
    collapse_whitespace(text)
        .to_lowercase()
        .contains(&CITED_BY.to_lowercase())
}

fn digits_to_count(text: &str) -> u32 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();

    match digits.parse::<u32>() {
        Ok(count) => count,
        Err(e) => {
            tracing::trace!("No usable citation count in '{}': {}", text, e);
            0
        }
    }
}

/// Normalizes a raw title
///
/// Collapses whitespace and strips leading type markers such as `[PDF]`,
/// `[BOOK][B]` or `[CITATION][C]`.
///
/// # Example
///
/// ```
/// use scholar_harvest::crawler::fields::clean_title;
///
/// assert_eq!(clean_title("[CITATION][C]  Air pollutants\n and health"), "Air pollutants and health");
/// ```
pub fn clean_title(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    let mut title = collapsed.as_str();

    while let Some(rest) = strip_type_marker(title) {
        title = rest.trim_start();
    }

    title.to_string()
}

fn strip_type_marker(title: &str) -> Option<&str> {
    let inner = title.strip_prefix('[')?;
    let end = inner.find(']')?;
    let marker = &inner[..end];

    let is_marker = !marker.is_empty()
        && marker.len() <= MAX_MARKER_LEN
        && marker.chars().all(|c| c.is_ascii_uppercase());

    is_marker.then(|| &inner[end + 1..])
}

/// Joins whitespace-separated words with single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
