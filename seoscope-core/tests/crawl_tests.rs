// Tests for crawl functionality

use seoscope_core::crawl::{
    CrawlOptions, CrawlProgressCallback, CrawlSummary, describe_event, execute_crawl,
    extract_url_path,
};
use seoscope_scanner::crawler::CancelHandle;
use seoscope_scanner::event::CrawlEvent;
use seoscope_scanner::result::PageStatus;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::path};

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("http://example.com/"), "/");
    assert_eq!(extract_url_path("http://example.com"), "/");
}

#[test]
fn test_extract_url_path_nested() {
    assert_eq!(extract_url_path("http://example.com/blog/2024/post"), "/blog/2024/post");
}

#[test]
fn test_extract_url_path_with_query_and_fragment() {
    assert_eq!(extract_url_path("http://example.com/search?q=seo#top"), "/search");
}

#[test]
fn test_extract_url_path_invalid() {
    assert_eq!(extract_url_path("not a url"), "not a url");
}

// ============================================================================
// Options and Events
// ============================================================================

#[test]
fn test_crawl_options_defaults() {
    let options = CrawlOptions::new("https://example.com");
    assert_eq!(options.max_pages, 50);
    assert_eq!(options.workers, 5);
    assert_eq!(options.batch_delay, Duration::from_secs(1));
    assert!(!options.cache_probes);

    let config = options.to_config();
    assert_eq!(config.max_pages, 50);
    assert_eq!(config.fetch_timeout, Duration::from_secs(10));
    assert!(config.user_agent.starts_with("seoscope/"));
}

#[test]
fn test_describe_event() {
    let message = describe_event(&CrawlEvent::PageCompleted {
        url: "https://example.com/about".to_string(),
        status: PageStatus::Code(200),
        pages_done: 3,
        max_pages: 50,
    });
    assert_eq!(message, "[3/50] 200 /about");

    let message = describe_event(&CrawlEvent::Cancelled { pages_done: 7 });
    assert!(message.contains("7 pages"));

    let message = describe_event(&CrawlEvent::CrawlFinished {
        pages: 5,
        visited: 5,
        pending: 15,
    });
    assert_eq!(message, "Crawl complete! 5 pages analyzed, 15 left unvisited");
}

// ============================================================================
// Execution
// ============================================================================

fn quiet_options(url: String) -> CrawlOptions {
    CrawlOptions {
        batch_delay: Duration::ZERO,
        fetch_timeout: Duration::from_secs(2),
        probe_timeout: Duration::from_secs(1),
        show_progress_bars: false,
        ..CrawlOptions::new(url)
    }
}

#[tokio::test]
async fn test_execute_crawl_reports_progress() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Home</title></head><body><h1>Home</h1><a href="/next">Next</a></body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head></head><body><h1>Next</h1></body></html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let messages_clone = messages.clone();
    let callback: CrawlProgressCallback = Arc::new(move |message: String| {
        messages_clone.lock().unwrap().push(message);
    });

    let result = execute_crawl(quiet_options(server.uri()), CancelHandle::new(), Some(callback))
        .await
        .unwrap();

    let summary = CrawlSummary::from_result(&result);
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.failed_pages, 0);
    assert_eq!(summary.internal_links, 1);
    assert_eq!(summary.broken_links, 0);

    let messages = messages.lock().unwrap();
    assert!(messages.first().unwrap().starts_with("Crawling"));
    assert!(messages.iter().any(|m| m.ends_with("200 /next")));
    assert!(messages.last().unwrap().contains("2 pages analyzed"));
}

#[tokio::test]
async fn test_execute_crawl_cancelled_before_start() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .mount(&server)
        .await;

    let cancel = CancelHandle::new();
    cancel.cancel();
    let result = execute_crawl(quiet_options(server.uri()), cancel, None)
        .await
        .unwrap();

    assert!(result.pages.is_empty());
    assert_eq!(result.status, PageStatus::Code(200));
}

#[tokio::test]
async fn test_execute_crawl_rejects_invalid_seed() {
    let result = execute_crawl(quiet_options("::nope::".to_string()), CancelHandle::new(), None).await;
    assert!(result.is_err());
}
