use crate::commands::DEFAULT_OUTPUT;
use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use clap::parser::ValueSource;
use colored::Colorize;
use seoscope_core::crawl::{CrawlOptions, CrawlSummary, execute_crawl};
use seoscope_core::report::{
    ReportFormat, generate_json_report, generate_text_report, save_report,
};
use seoscope_scanner::crawler::CancelHandle;
use seoscope_scanner::result::CrawlResult;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const EXIT_OK: i32 = 0;
pub const EXIT_BROKEN_LINKS: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

/// Parse a single line as a seed URL, trying to add https:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Try to parse as-is
    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some()
    {
        return Some(line.to_string());
    }

    // Try adding https://
    let with_scheme = format!("https://{}", line);
    match Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some() && !line.contains(char::is_whitespace) => {
            Some(with_scheme)
        }
        _ => None,
    }
}

/// Ask for a seed URL until a usable one is entered. Fails on end of input.
pub fn prompt_for_url<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<String> {
    loop {
        write!(output, "{} ", "Enter the URL to crawl:".bright_cyan().bold())?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("no URL provided");
        }
        match parse_url_line(&line) {
            Some(url) => return Ok(url),
            None if line.trim().is_empty() => continue,
            None => writeln!(output, "{} '{}' is not a valid URL", "✗".red(), line.trim())?,
        }
    }
}

/// Tracing filter directive for the number of `-v` flags.
pub fn verbosity_filter(count: u8) -> &'static str {
    match count {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Expand `~` in the output path. When the user kept the default output name
/// the extension follows the chosen format.
pub fn resolve_output_path(raw: &str, format: ReportFormat, is_default: bool) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
    if is_default {
        expanded.with_extension(format.extension())
    } else {
        expanded
    }
}

pub fn crawl_options_from_matches(sub_matches: &ArgMatches, url: String) -> CrawlOptions {
    let defaults = CrawlOptions::new(url);
    CrawlOptions {
        max_pages: sub_matches
            .get_one::<usize>("max-pages")
            .copied()
            .unwrap_or(defaults.max_pages),
        workers: sub_matches
            .get_one::<usize>("threads")
            .copied()
            .unwrap_or(defaults.workers),
        batch_delay: sub_matches
            .get_one::<u64>("delay-ms")
            .map(|ms| Duration::from_millis(*ms))
            .unwrap_or(defaults.batch_delay),
        fetch_timeout: sub_matches
            .get_one::<u64>("timeout")
            .map(|s| Duration::from_secs(*s))
            .unwrap_or(defaults.fetch_timeout),
        probe_timeout: sub_matches
            .get_one::<u64>("probe-timeout")
            .map(|s| Duration::from_secs(*s))
            .unwrap_or(defaults.probe_timeout),
        cache_probes: sub_matches.get_flag("cache-probes"),
        ..defaults
    }
}

pub fn exit_code_for(result: &CrawlResult) -> i32 {
    if result.has_broken_links() {
        EXIT_BROKEN_LINKS
    } else {
        EXIT_OK
    }
}

pub fn render_report(result: &CrawlResult, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => generate_json_report(result).context("failed to serialize report"),
        ReportFormat::Text => Ok(generate_text_report(result, chrono::Utc::now())),
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_summary(result: &CrawlResult, output: &Path) {
    let summary = CrawlSummary::from_result(result);

    println!();
    print_divider();
    println!("{}", "  CRAWL SUMMARY".bright_white().bold());
    print_divider();
    println!("  {} {}", "Site:".bright_white(), result.url);
    println!("  {} {}", "Pages crawled:".bright_white(), summary.pages);
    if summary.failed_pages > 0 {
        println!(
            "  {} {}",
            "Failed pages:".bright_white(),
            summary.failed_pages.to_string().yellow()
        );
    }
    println!("  {} {}", "Internal links:".bright_white(), summary.internal_links);
    println!("  {} {}", "External links:".bright_white(), summary.external_links);
    let broken = if summary.broken_links > 0 {
        summary.broken_links.to_string().red().bold()
    } else {
        summary.broken_links.to_string().green()
    };
    println!("  {} {}", "Broken links:".bright_white(), broken);
    println!(
        "\n{} Report saved to {}",
        "✓".green().bold(),
        output.display().to_string().bright_white()
    );
}

/// Run the `crawl` subcommand and return the process exit code.
pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<i32> {
    let url = match sub_matches.get_one::<String>("URL") {
        Some(raw) => parse_url_line(raw).with_context(|| format!("invalid URL '{}'", raw))?,
        None => {
            let stdin = io::stdin();
            prompt_for_url(stdin.lock(), io::stdout())?
        }
    };

    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Json);
    let output_is_default =
        sub_matches.value_source("output") == Some(ValueSource::DefaultValue);
    let output = resolve_output_path(
        sub_matches
            .get_one::<String>("output")
            .map(String::as_str)
            .unwrap_or(DEFAULT_OUTPUT),
        format,
        output_is_default,
    );

    let mut options = crawl_options_from_matches(sub_matches, url);
    options.show_progress_bars = !quiet;

    if !quiet {
        println!("{} {}", "Crawling".bright_cyan().bold(), options.url.bright_white());
        println!("Workers: {}", options.workers);
        println!("Max pages: {}\n", options.max_pages);
    }

    let cancel = CancelHandle::new();
    let ctrl_c_handle = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current batch");
            ctrl_c_handle.cancel();
        }
    });

    let outcome = execute_crawl(options, cancel, None).await;
    signal_task.abort();
    let result = outcome.context("crawl failed")?;

    let report = render_report(&result, format)?;
    save_report(&report, &output)
        .with_context(|| format!("failed to write report to {}", output.display()))?;

    if !quiet {
        print_summary(&result, &output);
    }

    Ok(exit_code_for(&result))
}

/// Install the fmt subscriber. `RUST_LOG` wins over the `-v` count.
pub fn init_tracing(verbosity: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity_filter(verbosity)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Shared by `main` for errors that abort the run.
pub fn report_fatal(error: &anyhow::Error) -> i32 {
    eprintln!("{} {:#}", "✗".red().bold(), error);
    EXIT_FATAL
}

pub fn print_prompt_hint() {
    println!(
        "{}",
        "Run `seoscope crawl <URL>` to audit a site, or `seoscope --help` for options.".dimmed()
    );
}
