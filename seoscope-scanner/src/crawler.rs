use crate::aggregate::aggregate;
use crate::analyzer::{AnalyzedPage, PageAnalyzer};
use crate::checker::LinkChecker;
use crate::error::{Result, ScanError};
use crate::event::{CrawlEvent, EventCallback, emit};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::normalize::NormalizedUrl;
use crate::result::{CrawlResult, PageRecord, PageStatus};
use crate::state::CrawlState;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of page records the crawl produces.
    pub max_pages: usize,
    /// Worker pool size, which is also the batch size.
    pub workers: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    /// Concurrent link probes per page.
    pub probe_concurrency: usize,
    /// Reuse the first probe verdict for a target URL instead of re-probing.
    pub cache_probes: bool,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            workers: 5,
            batch_delay: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            probe_concurrency: 8,
            cache_probes: false,
            user_agent: format!("seoscope/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Cooperative stop signal, checked between batches.
///
/// Cancelling never interrupts an in-flight batch; the crawl stops before
/// forming the next one and still returns the pages recorded so far.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Crawler<F = HttpFetcher> {
    fetcher: Arc<F>,
    config: CrawlConfig,
    event_callback: Option<EventCallback>,
    cancel: CancelHandle,
}

impl Crawler<HttpFetcher> {
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlConfig::default())
    }

    pub fn with_config(config: CrawlConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.user_agent, config.fetch_timeout, config.probe_timeout)?;
        Ok(Self::with_fetcher(fetcher, config))
    }
}

impl<F: Fetcher> Crawler<F> {
    pub fn with_fetcher(fetcher: F, config: CrawlConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            config,
            event_callback: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.config.max_pages = max_pages;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.config.batch_delay = delay;
        self
    }

    pub fn with_probe_cache(mut self, cache_probes: bool) -> Self {
        self.config.cache_probes = cache_probes;
        self
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Crawl the site rooted at `start_url`.
    ///
    /// Only an unusable seed URL is an error. Fetch and parse failures of
    /// individual pages end up as `Error` records in the result.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlResult> {
        let seed = parse_seed(start_url)?;
        let domain = seed
            .network_location()
            .ok_or_else(|| ScanError::InvalidUrl(format!("URL has no host: {}", start_url)))?;
        let max_pages = self.config.max_pages;
        let workers = self.config.workers.max(1);

        info!(
            "Starting crawl of {} with {} workers (max {} pages)",
            seed, workers, max_pages
        );

        let root_status = match self.fetcher.probe(seed.as_str()).await {
            Ok(code) => PageStatus::Code(code),
            Err(e) => {
                warn!("Root probe failed for {}: {}", seed, e);
                PageStatus::Error
            }
        };
        emit(
            &self.event_callback,
            CrawlEvent::CrawlStarted {
                seed: seed.to_string(),
                root_status,
            },
        );

        let state = CrawlState::new();
        state.offer_if_unseen(seed.clone()).await;

        let checker = Arc::new(LinkChecker::new(self.fetcher.clone(), self.config.cache_probes));
        let analyzer = Arc::new(PageAnalyzer::new(
            checker,
            domain.clone(),
            self.config.probe_concurrency,
        ));

        let mut batch_number = 0;
        loop {
            let pages_done = state.page_count().await;
            if self.cancel.is_cancelled() {
                info!("Crawl cancelled after {} pages", pages_done);
                emit(&self.event_callback, CrawlEvent::Cancelled { pages_done });
                break;
            }
            if pages_done >= max_pages {
                debug!("Page budget of {} reached", max_pages);
                break;
            }

            let batch = state.dispatch_batch(workers.min(max_pages - pages_done)).await;
            if batch.is_empty() {
                debug!("Frontier exhausted");
                break;
            }

            batch_number += 1;
            debug!("Batch {}: {} URLs", batch_number, batch.len());
            emit(
                &self.event_callback,
                CrawlEvent::BatchStarted {
                    batch: batch_number,
                    size: batch.len(),
                },
            );

            let mut tasks = JoinSet::new();
            for url in batch.iter().cloned() {
                let fetcher = self.fetcher.clone();
                let analyzer = analyzer.clone();
                let state = state.clone();
                let events = self.event_callback.clone();
                tasks.spawn(async move {
                    process_page(fetcher, analyzer, state, events, url, max_pages).await;
                });
            }

            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    error!("Worker task failed: {}", e);
                }
            }
            state
                .record_missing(&batch, |url| PageRecord::with_error(url.to_string()))
                .await;

            let more_work = state.pending_count().await > 0 && state.page_count().await < max_pages;
            if more_work && !self.cancel.is_cancelled() && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        let snapshot = state.drain().await;
        info!(
            "Crawl complete. Visited {} pages, {} still queued",
            snapshot.visited, snapshot.pending
        );
        emit(
            &self.event_callback,
            CrawlEvent::CrawlFinished {
                pages: snapshot.pages.len(),
                visited: snapshot.visited,
                pending: snapshot.pending,
            },
        );

        Ok(aggregate(
            root_status,
            domain,
            seed.to_string(),
            snapshot.pages,
            snapshot.external,
            snapshot.broken,
            snapshot.found_on,
        ))
    }
}

/// Fetch, analyze and record one URL. Never fails: errors become an `Error` record.
async fn process_page<F: Fetcher>(
    fetcher: Arc<F>,
    analyzer: Arc<PageAnalyzer<F>>,
    state: CrawlState,
    events: Option<EventCallback>,
    url: NormalizedUrl,
    max_pages: usize,
) {
    emit(&events, CrawlEvent::PageStarted { url: url.to_string() });

    let page = match fetcher.fetch(url.as_str()).await {
        Ok(response) => analyzer.analyze(&url, response).await,
        Err(e) => {
            warn!("Crawl error for {}: {}", url, e);
            AnalyzedPage {
                record: PageRecord::with_error(url.to_string()),
                internal_targets: Vec::new(),
            }
        }
    };

    let status = page.record.status;
    let pages_done = state.record_page(page).await;
    emit(
        &events,
        CrawlEvent::PageCompleted {
            url: url.to_string(),
            status,
            pages_done,
            max_pages,
        },
    );
}

/// Validate and normalize the seed. This is the only fatal input error.
pub fn parse_seed(start_url: &str) -> Result<NormalizedUrl> {
    let parsed = Url::parse(start_url.trim())
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ScanError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            parsed.scheme(),
            start_url
        )));
    }
    if parsed.host_str().is_none() {
        return Err(ScanError::InvalidUrl(format!("URL has no host: {}", start_url)));
    }

    Ok(NormalizedUrl::from_url(&parsed))
}
