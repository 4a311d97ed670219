use seoscope::commands::{DEFAULT_OUTPUT, command_argument_builder};
use seoscope::handlers::*;
use seoscope_core::report::ReportFormat;
use seoscope_scanner::result::{CrawlResult, FoundOn, LinkMap, PageStatus};
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn empty_result() -> CrawlResult {
    CrawlResult {
        status: PageStatus::Code(200),
        domain: "example.com".to_string(),
        url: "https://example.com".to_string(),
        pages: Vec::new(),
        external: LinkMap::new(),
        broken: LinkMap::new(),
        found_on: FoundOn::new(),
    }
}

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    assert_eq!(
        parse_url_line("  example.com  "),
        Some("https://example.com".to_string())
    );
    assert_eq!(
        parse_url_line("localhost:8080"),
        Some("https://localhost:8080".to_string())
    );
}

#[test]
fn test_parse_url_line_invalid() {
    assert_eq!(parse_url_line("not a valid url!!!"), None);
    assert_eq!(parse_url_line(""), None);
}

#[test]
fn test_prompt_for_url_retries_until_valid() {
    let input = Cursor::new("\nnot a url\nexample.com\n");
    let mut output = Vec::new();

    let url = prompt_for_url(input, &mut output).unwrap();
    assert_eq!(url, "https://example.com");

    let shown = String::from_utf8(output).unwrap();
    assert!(shown.contains("'not a url' is not a valid URL"));
}

#[test]
fn test_prompt_for_url_end_of_input() {
    let input = Cursor::new("");
    let result = prompt_for_url(input, Vec::new());
    assert!(result.is_err());
}

#[test]
fn test_verbosity_filter() {
    assert_eq!(verbosity_filter(0), "warn");
    assert_eq!(verbosity_filter(1), "info");
    assert_eq!(verbosity_filter(2), "debug");
    assert_eq!(verbosity_filter(5), "debug");
}

#[test]
fn test_resolve_output_path_default_follows_format() {
    assert_eq!(
        resolve_output_path(DEFAULT_OUTPUT, ReportFormat::Text, true),
        PathBuf::from("seo_report.txt")
    );
    assert_eq!(
        resolve_output_path(DEFAULT_OUTPUT, ReportFormat::Json, true),
        PathBuf::from("seo_report.json")
    );
}

#[test]
fn test_resolve_output_path_explicit_is_kept() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("audit.out");
    let resolved = resolve_output_path(raw.to_str().unwrap(), ReportFormat::Text, false);
    assert_eq!(resolved, raw);
}

#[test]
fn test_crawl_options_from_matches() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "seoscope",
            "crawl",
            "https://example.com",
            "-m",
            "12",
            "-t",
            "3",
            "--delay-ms",
            "250",
            "--timeout",
            "4",
            "--probe-timeout",
            "2",
            "--cache-probes",
        ])
        .unwrap();
    let (_, crawl) = matches.subcommand().unwrap();

    let options = crawl_options_from_matches(crawl, "https://example.com".to_string());
    assert_eq!(options.url, "https://example.com");
    assert_eq!(options.max_pages, 12);
    assert_eq!(options.workers, 3);
    assert_eq!(options.batch_delay, Duration::from_millis(250));
    assert_eq!(options.fetch_timeout, Duration::from_secs(4));
    assert_eq!(options.probe_timeout, Duration::from_secs(2));
    assert!(options.cache_probes);
}

#[test]
fn test_exit_code_for_broken_links() {
    let mut result = empty_result();
    assert_eq!(exit_code_for(&result), EXIT_OK);

    result
        .broken
        .insert("https://example.com/gone".to_string(), vec!["Gone".to_string()]);
    assert_eq!(exit_code_for(&result), EXIT_BROKEN_LINKS);
}

#[test]
fn test_render_report_formats() {
    let result = empty_result();

    let json = render_report(&result, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["domain"], "example.com");

    let text = render_report(&result, ReportFormat::Text).unwrap();
    assert!(text.contains("SEO Crawl Report"));
}
