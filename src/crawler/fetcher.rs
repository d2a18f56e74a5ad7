//! HTTP fetcher implementation
//!
//! This module issues the request for one results page and classifies the
//! outcome:
//! - Building the HTTP client (timeouts, compression, optional proxy)
//! - Waiting the jittered request delay and picking a client identity
//! - Classifying network, status and content failures
//! - Handing successful pages to the record extractor
//!
//! There are no retries here. Whether a failed page ends the crawl is decided
//! by the coordinator.

use crate::config::Config;
use crate::crawler::parser::RecordExtractor;
use crate::crawler::scheduler::{Pacer, RandomPacer};
use crate::record::Record;
use crate::HarvestError;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy, StatusCode};
use std::time::Duration;
use url::Url;

/// Outcome of fetching one results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetchResult {
    /// The page held at least one record
    Success(Vec<Record>),

    /// The page was fetched but held no records (end of results or a block page)
    Empty,

    /// Network failure or non-success HTTP status
    TransientError {
        /// Error description
        reason: String,
        /// HTTP status, when a response was received
        status: Option<u16>,
    },

    /// The response is not a results document or the request could not be built
    FatalError {
        /// Error description
        reason: String,
    },
}

impl PageFetchResult {
    /// Short name of the outcome, for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Empty => "empty",
            Self::TransientError { .. } => "transient error",
            Self::FatalError { .. } => "fatal error",
        }
    }
}

/// Anything that can fetch a results page
///
/// Implemented by [`Fetcher`]; the coordinator is generic over it so crawls
/// can be driven by scripted sources in tests.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Fetches one page and classifies the outcome
    async fn fetch_page(&mut self, url: &Url) -> PageFetchResult;
}

/// HTTP settings for the fetcher
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Whole-request timeout
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Accept-Language header value
    pub accept_language: Option<String>,

    /// Proxy URL for all requests
    pub proxy: Option<String>,
}

impl FetchSettings {
    /// Reads the HTTP settings from the configuration
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.crawler.timeout();
        Self {
            timeout,
            connect_timeout: timeout.min(Duration::from_secs(10)),
            accept_language: config.identity.accept_language.clone(),
            proxy: config.crawler.proxy.clone(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            accept_language: None,
            proxy: None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// No User-Agent is set on the client; every request carries the identity
/// picked by the pacer.
///
/// # Example
///
/// ```no_run
/// use scholar_harvest::crawler::{build_http_client, FetchSettings};
///
/// let client = build_http_client(&FetchSettings::default()).unwrap();
/// ```
pub fn build_http_client(settings: &FetchSettings) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &settings.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Fetches results pages one request at a time
pub struct Fetcher<P: Pacer = RandomPacer> {
    client: Client,
    pacer: P,
    extractor: RecordExtractor,
    accept_language: Option<String>,
}

impl<P: Pacer> Fetcher<P> {
    /// Creates a fetcher with a freshly built client
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Ready to fetch
    /// * `Err(HarvestError)` - The client or the extractor could not be built
    pub fn new(settings: &FetchSettings, pacer: P) -> Result<Self, HarvestError> {
        let client = build_http_client(settings)?;
        Self::with_client(client, settings, pacer)
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(
        client: Client,
        settings: &FetchSettings,
        pacer: P,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            client,
            pacer,
            extractor: RecordExtractor::new()?,
            accept_language: settings.accept_language.clone(),
        })
    }

    /// Fetches a page and extracts its records
    ///
    /// # Request Flow
    ///
    /// 1. Wait the jittered request delay
    /// 2. Send a GET with a rotated User-Agent
    /// 3. Classify the response
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | Connection failure / timeout | TransientError |
    /// | Non-success HTTP status (429 included) | TransientError |
    /// | Body cannot be read | TransientError |
    /// | Content-Type present and not HTML | FatalError |
    /// | Request cannot be built | FatalError |
    /// | HTML with records | Success |
    /// | HTML without records | Empty |
    pub async fn fetch(&mut self, url: &Url) -> PageFetchResult {
        let delay = self.pacer.request_delay();
        tracing::debug!("Waiting {:?} before requesting {}", delay, url);
        tokio::time::sleep(delay).await;

        let identity = self.pacer.identity();
        tracing::trace!("Requesting {} as '{}'", url, identity);

        let mut request = self.client.get(url.clone()).header(USER_AGENT, identity);
        if let Some(language) = &self.accept_language {
            request = request.header(ACCEPT_LANGUAGE, language.as_str());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(&e),
        };

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limited (HTTP 429) at {}", url);
        }

        if !status.is_success() {
            return PageFetchResult::TransientError {
                reason: format!("HTTP {}", status.as_u16()),
                status: Some(status.as_u16()),
            };
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(content_type) = content_type {
            if !content_type.contains("html") {
                return PageFetchResult::FatalError {
                    reason: format!("Expected HTML, got {}", content_type),
                };
            }
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return PageFetchResult::TransientError {
                    reason: format!("Failed to read body: {}", e),
                    status: Some(status.as_u16()),
                }
            }
        };

        let records = self.extractor.extract(&body, url);
        tracing::debug!("Extracted {} records from {}", records.len(), url);

        if records.is_empty() {
            PageFetchResult::Empty
        } else {
            PageFetchResult::Success(records)
        }
    }
}

impl<P: Pacer> PageSource for Fetcher<P> {
    async fn fetch_page(&mut self, url: &Url) -> PageFetchResult {
        self.fetch(url).await
    }
}

/// Maps a reqwest send error to a page outcome
fn classify_request_error(e: &reqwest::Error) -> PageFetchResult {
    if e.is_builder() {
        PageFetchResult::FatalError {
            reason: format!("Invalid request: {}", e),
        }
    } else if e.is_timeout() {
        PageFetchResult::TransientError {
            reason: "Request timeout".to_string(),
            status: None,
        }
    } else if e.is_connect() {
        PageFetchResult::TransientError {
            reason: format!("Connection failed: {}", e),
            status: None,
        }
    } else {
        PageFetchResult::TransientError {
            reason: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        }
    }
}
