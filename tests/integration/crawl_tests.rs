//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use scholar_harvest::config::parse_config;
use scholar_harvest::crawler::{
    run_crawl, CancelFlag, Coordinator, FetchSettings, Fetcher, FixedPacer, NullProgress,
    PageFetchResult, PageSource,
};
use scholar_harvest::output::write_csv;
use scholar_harvest::StopReason;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AGENT: &str = "TestAgent/1.0";

/// Builds a results page holding records `first..first + count`
fn results_page(first: usize, count: usize) -> String {
    let blocks: String = (first..first + count)
        .map(|i| {
            format!(
                r#"<div class="gs_r gs_or gs_scl"><div class="gs_ri">
                <h3 class="gs_rt"><a href="https://example.org/paper/{i}">Paper {i}</a></h3>
                <div class="gs_a">A Author, B Author - Journal of Tests, {year} - example.org</div>
                <div class="gs_rs">Snippet for paper {i}</div>
                <div class="gs_fl"><a href="/scholar?cites={i}">Cited by {cites}</a> <a href="/related">Related articles</a></div>
                </div></div>"#,
                i = i,
                year = 2000 + (i % 20),
                cites = i + 1,
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Results</title></head><body><div id="gs_res_ccl_mid">{}</div></body></html>"#,
        blocks
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, start: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", start))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn base_query(server: &MockServer) -> Url {
    Url::parse(&format!("{}/scholar?q=test&hl=en", server.uri())).expect("valid base query")
}

fn test_fetcher() -> Fetcher<FixedPacer> {
    Fetcher::new(&FetchSettings::default(), FixedPacer::immediate(AGENT))
        .expect("Failed to build fetcher")
}

fn test_coordinator() -> Coordinator<Fetcher<FixedPacer>, FixedPacer> {
    Coordinator::new(test_fetcher(), FixedPacer::immediate(AGENT))
        .with_progress(Box::new(NullProgress))
}

#[tokio::test]
async fn test_crawl_truncates_to_target() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "0", results_page(0, 10)).await;
    mount_page(&mock_server, "10", results_page(10, 10)).await;
    mount_page(&mock_server, "20", results_page(20, 10)).await;

    // Three pages cover a target of 25; the fourth is never requested
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "30"))
        .respond_with(html(results_page(0, 0)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = test_coordinator()
        .crawl(&base_query(&mock_server), 25)
        .await;

    assert_eq!(report.records.len(), 25);
    assert_eq!(report.pages_issued, 3);
    assert_eq!(report.stop_reason, StopReason::TargetReached);
    assert_eq!(report.records[0].title, "Paper 0");
    assert_eq!(report.records[24].title, "Paper 24");
}

#[tokio::test]
async fn test_crawl_stops_on_empty_page() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "0", results_page(0, 10)).await;
    mount_page(&mock_server, "10", results_page(10, 10)).await;
    mount_page(&mock_server, "20", results_page(20, 10)).await;
    mount_page(&mock_server, "30", results_page(0, 0)).await;

    let report = test_coordinator()
        .crawl(&base_query(&mock_server), 40)
        .await;

    assert_eq!(report.records.len(), 30);
    assert_eq!(report.pages_issued, 4);
    assert_eq!(report.stop_reason, StopReason::SourceExhausted);
}

#[tokio::test]
async fn test_server_error_keeps_earlier_records() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "0", results_page(0, 10)).await;

    // Failed page is requested exactly once
    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "10"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "20"))
        .respond_with(html(results_page(20, 10)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = test_coordinator()
        .crawl(&base_query(&mock_server), 30)
        .await;

    assert_eq!(report.records.len(), 10);
    assert_eq!(
        report.stop_reason,
        StopReason::PageFailed("HTTP 500".to_string())
    );
}

#[tokio::test]
async fn test_extracted_fields() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "0", results_page(0, 3)).await;

    let mut fetcher = test_fetcher();
    let url = Url::parse(&format!("{}/scholar?q=test&start=0", mock_server.uri())).unwrap();

    let PageFetchResult::Success(records) = fetcher.fetch_page(&url).await else {
        panic!("Expected a successful page");
    };

    assert_eq!(records.len(), 3);
    let record = &records[2];
    assert_eq!(record.title, "Paper 2");
    assert_eq!(record.url.as_deref(), Some("https://example.org/paper/2"));
    assert_eq!(record.authors, "A Author, B Author");
    assert_eq!(record.year, Some(2002));
    assert_eq!(record.description, "Snippet for paper 2");
    assert_eq!(record.citations, 3);
}

#[tokio::test]
async fn test_request_carries_identity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(header("user-agent", AGENT))
        .respond_with(html(results_page(0, 10)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = test_coordinator()
        .crawl(&base_query(&mock_server), 10)
        .await;

    assert_eq!(report.records.len(), 10);
}

#[tokio::test]
async fn test_non_html_response_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(br#"{"results": []}"#.to_vec(), "application/json"),
        )
        .mount(&mock_server)
        .await;

    let mut fetcher = test_fetcher();
    let result = fetcher.fetch_page(&base_query(&mock_server)).await;

    assert!(matches!(result, PageFetchResult::FatalError { .. }));
}

#[tokio::test]
async fn test_rate_limit_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let mut fetcher = test_fetcher();
    let result = fetcher.fetch_page(&base_query(&mock_server)).await;

    assert_eq!(
        result,
        PageFetchResult::TransientError {
            reason: "HTTP 429".to_string(),
            status: Some(429),
        }
    );
}

#[tokio::test]
async fn test_page_without_results_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .respond_with(html(
            "<html><body><p>Please show you're not a robot</p></body></html>".to_string(),
        ))
        .mount(&mock_server)
        .await;

    let mut fetcher = test_fetcher();
    let result = fetcher.fetch_page(&base_query(&mock_server)).await;

    assert_eq!(result, PageFetchResult::Empty);
}

#[tokio::test]
async fn test_cancelled_crawl_issues_no_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(results_page(0, 10)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = test_coordinator()
        .with_cancel_flag(cancel)
        .crawl(&base_query(&mock_server), 20)
        .await;

    assert!(report.records.is_empty());
    assert_eq!(report.stop_reason, StopReason::Cancelled);
}

#[tokio::test]
async fn test_end_to_end_from_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("q", "machine learning"))
        .and(query_param("as_ylo", "2000"))
        .and(query_param("start", "0"))
        .respond_with(html(results_page(0, 10)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/scholar"))
        .and(query_param("start", "10"))
        .respond_with(html(results_page(10, 10)))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("results.csv");

    let config = parse_config(&format!(
        r#"
[query]
term = "machine learning"
year-low = 2000
base-url = "{}/scholar"

[crawler]
target-count = 15
request-delay = {{ min = 0, max = 0 }}
page-delay = {{ min = 0, max = 0 }}

[output]
csv-path = "{}"
"#,
        mock_server.uri(),
        csv_path.display()
    ))
    .expect("Failed to parse config");

    let report = run_crawl(&config, Some(42), CancelFlag::new())
        .await
        .expect("Crawl setup failed");
    assert_eq!(report.records.len(), 15);

    let finalized = write_csv(
        report.records,
        Some(config.crawler.target_count),
        &config.csv_path(),
    )
    .expect("Failed to write CSV");
    assert!(finalized.sorted);

    // Newest first: paper 14 carries 2014
    assert_eq!(finalized.records[0].year, Some(2014));

    let content = std::fs::read_to_string(&csv_path).expect("Failed to read CSV");
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("title,url,authors,year,description,citations")
    );
    assert_eq!(lines.count(), 15);
}

#[tokio::test]
async fn test_crawl_is_paced() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "0", results_page(0, 10)).await;
    mount_page(&mock_server, "10", results_page(10, 10)).await;

    let delay = std::time::Duration::from_millis(30);
    let pacer = FixedPacer {
        request_delay: delay,
        page_delay: delay,
        ..FixedPacer::immediate(AGENT)
    };
    let fetcher = Fetcher::new(&FetchSettings::default(), pacer.clone())
        .expect("Failed to build fetcher");
    let mut coordinator = Coordinator::new(fetcher, pacer).with_progress(Box::new(NullProgress));

    let started = std::time::Instant::now();
    let report = coordinator.crawl(&base_query(&mock_server), 20).await;

    // Two request delays and one page delay
    assert_eq!(report.records.len(), 20);
    assert!(started.elapsed() >= delay * 3);
}
