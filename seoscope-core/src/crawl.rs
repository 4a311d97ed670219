use indicatif::{ProgressBar, ProgressStyle};
use seoscope_scanner::crawler::{CancelHandle, CrawlConfig, Crawler};
use seoscope_scanner::error::ScanError;
use seoscope_scanner::event::{CrawlEvent, EventCallback};
use seoscope_scanner::result::CrawlResult;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub url: String,
    pub max_pages: usize,
    pub workers: usize,
    pub batch_delay: Duration,
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    pub cache_probes: bool,
    pub show_progress_bars: bool,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>) -> Self {
        let defaults = CrawlConfig::default();
        Self {
            url: url.into(),
            max_pages: defaults.max_pages,
            workers: defaults.workers,
            batch_delay: defaults.batch_delay,
            fetch_timeout: defaults.fetch_timeout,
            probe_timeout: defaults.probe_timeout,
            cache_probes: defaults.cache_probes,
            show_progress_bars: true,
        }
    }

    pub fn to_config(&self) -> CrawlConfig {
        CrawlConfig {
            max_pages: self.max_pages,
            workers: self.workers,
            batch_delay: self.batch_delay,
            fetch_timeout: self.fetch_timeout,
            probe_timeout: self.probe_timeout,
            cache_probes: self.cache_probes,
            ..CrawlConfig::default()
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Counts shown to the user once a crawl is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages: usize,
    pub failed_pages: usize,
    pub internal_links: usize,
    pub external_links: usize,
    pub broken_links: usize,
}

impl CrawlSummary {
    pub fn from_result(result: &CrawlResult) -> Self {
        Self {
            pages: result.pages.len(),
            failed_pages: result.failed_page_count(),
            internal_links: result.internal_link_count(),
            external_links: result.external.len(),
            broken_links: result.broken.len(),
        }
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// One-line description of a crawl event for progress output.
pub fn describe_event(event: &CrawlEvent) -> String {
    match event {
        CrawlEvent::CrawlStarted { seed, root_status } => {
            format!("Crawling {} (root status {})", seed, root_status)
        }
        CrawlEvent::BatchStarted { batch, size } => {
            format!("Batch {}: fetching {} pages", batch, size)
        }
        CrawlEvent::PageStarted { url } => format!("Fetching {}", extract_url_path(url)),
        CrawlEvent::PageCompleted {
            url,
            status,
            pages_done,
            max_pages,
        } => format!(
            "[{}/{}] {} {}",
            pages_done,
            max_pages,
            status,
            extract_url_path(url)
        ),
        CrawlEvent::Cancelled { pages_done } => {
            format!("Cancelled, finishing with {} pages", pages_done)
        }
        CrawlEvent::CrawlFinished { pages, pending, .. } if *pending > 0 => format!(
            "Crawl complete! {} pages analyzed, {} left unvisited",
            pages, pending
        ),
        CrawlEvent::CrawlFinished { pages, .. } => format!("Crawl complete! {} pages analyzed", pages),
    }
}

/// Execute a crawl with the given options
///
/// `cancel` stops the crawl at the next batch boundary; the pages analyzed so
/// far are still returned.
pub async fn execute_crawl(
    options: CrawlOptions,
    cancel: CancelHandle,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlResult, ScanError> {
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let pb_clone = progress_bar.clone();
    let callback_clone = progress_callback.clone();
    let observer: EventCallback = Arc::new(move |event: CrawlEvent| {
        if matches!(event, CrawlEvent::PageStarted { .. }) {
            return;
        }
        let message = describe_event(&event);
        if let Some(ref pb) = pb_clone {
            pb.set_message(message.clone());
        }
        if let Some(ref callback) = callback_clone {
            callback(message);
        }
    });

    let crawler = Crawler::with_config(options.to_config())?
        .with_event_callback(observer)
        .with_cancel_handle(cancel);

    let outcome = crawler.crawl(&options.url).await;

    if let Some(ref pb) = progress_bar {
        match &outcome {
            Ok(result) => pb.finish_with_message(format!(
                "Crawl complete! {} pages analyzed",
                result.pages.len()
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    outcome
}
