//! Record extraction from results pages
//!
//! Locates the repeating result blocks of a results page and pulls each
//! record's fields out of them. A page never fails as a whole: a block that
//! cannot be extracted is logged and skipped, and every field falls back to its
//! default when its element is missing.

use crate::crawler::fields::{
    clean_title, collapse_whitespace, extract_citation_count, parse_author_block, FooterLink,
};
use crate::record::{Record, UNTITLED};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// One result block
const RESULT_BLOCK: &str = "div.gs_r.gs_or.gs_scl";

/// Title container, relative to a block
const TITLE: &str = "h3.gs_rt";

/// Title link, relative to the title container
const TITLE_LINK: &str = "a[href]";

/// Author / venue / year byline, relative to a block
const AUTHOR_LINE: &str = "div.gs_a";

/// Snippet text, relative to a block
const SNIPPET: &str = "div.gs_rs";

/// Footer links, relative to a block
const FOOTER_LINKS: &str = "div.gs_fl a";

/// Errors raised while extracting records
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },

    #[error("Result block {index} has no text content")]
    EmptyBlock { index: usize },
}

/// Extracts records from results pages
///
/// Selectors are compiled once and reused for every page.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    block: Selector,
    title: Selector,
    title_link: Selector,
    author_line: Selector,
    snippet: Selector,
    footer_links: Selector,
}

impl RecordExtractor {
    /// Compiles the result-block selectors
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            block: compile(RESULT_BLOCK)?,
            title: compile(TITLE)?,
            title_link: compile(TITLE_LINK)?,
            author_line: compile(AUTHOR_LINE)?,
            snippet: compile(SNIPPET)?,
            footer_links: compile(FOOTER_LINKS)?,
        })
    }

    /// Parses a results page and extracts its records in document order
    ///
    /// # Arguments
    ///
    /// * `html` - The page body
    /// * `page_url` - The URL the page was fetched from, for resolving links
    ///
    /// # Example
    ///
    /// ```
    /// use scholar_harvest::crawler::RecordExtractor;
    /// use url::Url;
    ///
    /// let html = r#"<div class="gs_r gs_or gs_scl"><h3 class="gs_rt"><a href="/p">A paper</a></h3></div>"#;
    /// let page = Url::parse("https://example.com/scholar?q=x").unwrap();
    /// let records = RecordExtractor::new().unwrap().extract(html, &page);
    /// assert_eq!(records[0].title, "A paper");
    /// assert_eq!(records[0].url.as_deref(), Some("https://example.com/p"));
    /// ```
    pub fn extract(&self, html: &str, page_url: &Url) -> Vec<Record> {
        let document = Html::parse_document(html);
        self.extract_document(&document, page_url)
    }

    /// Extracts records from an already parsed document
    pub fn extract_document(&self, document: &Html, page_url: &Url) -> Vec<Record> {
        document
            .select(&self.block)
            .enumerate()
            .filter_map(
                |(index, block)| match self.extract_block(index, block, page_url) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!("Skipping result block on {}: {}", page_url, e);
                        None
                    }
                },
            )
            .collect()
    }

    /// Extracts one record from a result block
    fn extract_block(
        &self,
        index: usize,
        block: ElementRef<'_>,
        page_url: &Url,
    ) -> Result<Record, ExtractError> {
        if block.text().all(|fragment| fragment.trim().is_empty()) {
            return Err(ExtractError::EmptyBlock { index });
        }

        let (title, url) = self.extract_title(block, page_url);
        let (authors, year) = self.extract_byline(block);
        let description = self.extract_snippet(block);
        let citations = extract_citation_count(&self.footer_links(block));

        Ok(Record {
            title,
            url,
            authors,
            year,
            description,
            citations,
        })
    }

    fn extract_title(&self, block: ElementRef<'_>, page_url: &Url) -> (String, Option<String>) {
        let Some(container) = block.select(&self.title).next() else {
            tracing::trace!("Result block without title container on {}", page_url);
            return (UNTITLED.to_string(), None);
        };

        let title = clean_title(&container.text().collect::<String>());
        let title = if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };

        let url = container
            .select(&self.title_link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .and_then(|href| resolve_link(href, page_url));

        (title, url)
    }

    fn extract_byline(&self, block: ElementRef<'_>) -> (String, Option<u16>) {
        block
            .select(&self.author_line)
            .next()
            .map(|line| parse_author_block(&line.text().collect::<String>()))
            .unwrap_or_default()
    }

    fn extract_snippet(&self, block: ElementRef<'_>) -> String {
        block
            .select(&self.snippet)
            .next()
            .map(|snippet| collapse_whitespace(&snippet.text().collect::<String>()))
            .unwrap_or_default()
    }

    fn footer_links(&self, block: ElementRef<'_>) -> Vec<FooterLink> {
        block
            .select(&self.footer_links)
            .map(|link| FooterLink::new(link.text().collect::<String>(), link.value().attr("href")))
            .collect()
    }
}

fn compile(selector: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector,
        message: format!("{:?}", e),
    })
}

/// Resolves a title link to an absolute HTTP(S) URL
///
/// Returns None for script, mail, data and fragment-only links, and for
/// anything that does not resolve to HTTP(S).
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
<html><body><div id="gs_res_ccl_mid">
  <div class="gs_r gs_or gs_scl" data-cid="a1">
    <div class="gs_ri">
      <h3 class="gs_rt"><span class="gs_ctg2">[PDF]</span> <a href="https://example.org/air">Air pollutants, economic growth and public health</a></h3>
      <div class="gs_a">J Smith, A Doe - Journal of Health Economics, 2019 - Elsevier</div>
      <div class="gs_rs">This paper examines the relationship
        between air pollution and growth…</div>
      <div class="gs_fl gs_flb">
        <a href="javascript:void(0)">Save</a>
        <a href="/scholar?cites=111&amp;hl=en">Cited by 156</a>
        <a href="/scholar?q=related:a1">Related articles</a>
      </div>
    </div>
  </div>
  <div class="gs_r gs_or gs_scl" data-cid="a2">
    <div class="gs_ri">
      <h3 class="gs_rt"><span class="gs_ctc"><span class="gs_ct1">[CITATION]</span><span class="gs_ct2">[C]</span></span> Climate change and development</h3>
      <div class="gs_a">M Chen - 2020</div>
    </div>
  </div>
  <div class="gs_r gs_or gs_scl" data-cid="a3">
    <div class="gs_ri">
      <div class="gs_rs">Orphan snippet without title or byline</div>
      <div class="gs_fl"><a href="/scholar?cites=333">Zitiert von: 7</a></div>
    </div>
  </div>
  <div class="gs_r gs_or gs_scl">   </div>
  <div class="gs_r gs_or gs_scl" data-cid="a5">
    <div class="gs_ri">
      <h3 class="gs_rt"><a href="/relative/paper">Relative link paper</a></h3>
      <div class="gs_a">K Park… - Proceedings, 1875 - Press</div>
    </div>
  </div>
</div></body></html>
"#;

    fn page_url() -> Url {
        Url::parse("https://scholar.example.com/scholar?q=test&start=0").unwrap()
    }

    fn extract(html: &str) -> Vec<Record> {
        RecordExtractor::new().unwrap().extract(html, &page_url())
    }

    #[test]
    fn test_extracts_blocks_in_document_order() {
        let records = extract(RESULTS_PAGE);
        // The whitespace-only block is skipped
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].title, "Air pollutants, economic growth and public health");
        assert_eq!(records[1].title, "Climate change and development");
        assert_eq!(records[2].title, UNTITLED);
        assert_eq!(records[3].title, "Relative link paper");
    }

    #[test]
    fn test_full_block_fields() {
        let records = extract(RESULTS_PAGE);
        let first = &records[0];

        assert_eq!(first.url.as_deref(), Some("https://example.org/air"));
        assert_eq!(first.authors, "J Smith, A Doe");
        assert_eq!(first.year, Some(2019));
        assert_eq!(
            first.description,
            "This paper examines the relationship between air pollution and growth…"
        );
        assert_eq!(first.citations, 156);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let records = extract(RESULTS_PAGE);

        let citation_only = &records[1];
        assert_eq!(citation_only.url, None);
        assert_eq!(citation_only.authors, "M Chen");
        assert_eq!(citation_only.year, Some(2020));
        assert_eq!(citation_only.description, "");
        assert_eq!(citation_only.citations, 0);

        let orphan = &records[2];
        assert_eq!(orphan.url, None);
        assert_eq!(orphan.authors, "");
        assert_eq!(orphan.year, None);
        assert_eq!(orphan.description, "Orphan snippet without title or byline");
        assert_eq!(orphan.citations, 7);
    }

    #[test]
    fn test_relative_link_and_out_of_range_year() {
        let records = extract(RESULTS_PAGE);
        let last = &records[3];

        assert_eq!(
            last.url.as_deref(),
            Some("https://scholar.example.com/relative/paper")
        );
        assert_eq!(last.authors, "K Park");
        assert_eq!(last.year, None);
    }

    #[test]
    fn test_record_invariants_hold() {
        for record in extract(RESULTS_PAGE) {
            assert!(record.has_valid_year());
            assert!(!record.title.is_empty());
        }
    }

    #[test]
    fn test_page_without_blocks() {
        assert!(extract("<html><body><p>Please show you're not a robot</p></body></html>").is_empty());
        assert!(extract("").is_empty());
        assert!(extract("not even html <<<").is_empty());
    }

    #[test]
    fn test_resolve_link_filters_schemes() {
        let base = page_url();
        assert_eq!(resolve_link("javascript:void(0)", &base), None);
        assert_eq!(resolve_link("mailto:a@b.com", &base), None);
        assert_eq!(resolve_link("#top", &base), None);
        assert_eq!(resolve_link("   ", &base), None);
        assert_eq!(resolve_link("ftp://files.example.com/a.pdf", &base), None);
        assert_eq!(
            resolve_link("https://other.org/x", &base).as_deref(),
            Some("https://other.org/x")
        );
    }
}
