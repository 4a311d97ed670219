//! Shared crawl state behind one lock.
//!
//! Workers never touch the frontier, the page list or the global link maps
//! directly; every mutation goes through [`CrawlState`] so the frontier and
//! the visited ledger stay disjoint. No I/O happens while the lock is held.

use crate::aggregate::merge_link_maps;
use crate::analyzer::AnalyzedPage;
use crate::frontier::Frontier;
use crate::normalize::NormalizedUrl;
use crate::result::{FoundOn, LinkMap, PageRecord};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Default)]
struct Inner {
    frontier: Frontier,
    pages: Vec<PageRecord>,
    recorded: HashSet<String>,
    external: LinkMap,
    broken: LinkMap,
    found_on: FoundOn,
}

impl Inner {
    fn note_source(&mut self, source_page: &str, links: &LinkMap) {
        for target in links.keys() {
            let sources = self.found_on.entry(target.clone()).or_default();
            if !sources.iter().any(|s| s == source_page) {
                sources.push(source_page.to_string());
            }
        }
    }

    fn merge_external(&mut self, source_page: &str, links: &LinkMap) {
        merge_link_maps(&mut self.external, links);
        self.note_source(source_page, links);
    }

    fn merge_broken(&mut self, source_page: &str, links: &LinkMap) {
        merge_link_maps(&mut self.broken, links);
        self.note_source(source_page, links);
    }

    fn push_record(&mut self, record: PageRecord) -> bool {
        if !self.recorded.insert(record.url.clone()) {
            warn!("Ignoring duplicate record for {}", record.url);
            return false;
        }
        self.pages.push(record);
        true
    }
}

/// Everything the aggregator needs once the crawl is over.
#[derive(Debug, Default)]
pub struct CrawlSnapshot {
    pub pages: Vec<PageRecord>,
    pub external: LinkMap,
    pub broken: LinkMap,
    pub found_on: FoundOn,
    pub visited: usize,
    pub pending: usize,
}

#[derive(Clone, Default)]
pub struct CrawlState {
    inner: Arc<Mutex<Inner>>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `url` unless it is already queued or visited.
    pub async fn offer_if_unseen(&self, url: NormalizedUrl) -> bool {
        self.inner.lock().await.frontier.offer(url)
    }

    /// Take up to `n` queued URLs and mark them visited in the same critical section.
    pub async fn dispatch_batch(&self, n: usize) -> Vec<NormalizedUrl> {
        let mut inner = self.inner.lock().await;
        let batch = inner.frontier.take_batch(n);
        for url in &batch {
            inner.frontier.mark_visited(url.clone());
        }
        batch
    }

    /// Append a finished page, queue its unseen internal links and fold its
    /// external and broken links into the global maps.
    ///
    /// Returns the number of recorded pages.
    pub async fn record_page(&self, page: AnalyzedPage) -> usize {
        let mut inner = self.inner.lock().await;
        let AnalyzedPage {
            record,
            internal_targets,
        } = page;

        if inner.recorded.contains(&record.url) {
            warn!("Ignoring duplicate record for {}", record.url);
            return inner.pages.len();
        }

        for target in internal_targets {
            inner.frontier.offer(target);
        }
        inner.merge_external(&record.url, &record.external_links);
        inner.merge_broken(&record.url, &record.broken_links);
        inner.push_record(record);
        inner.pages.len()
    }

    /// Record `fallback` for each dispatched URL that produced no page.
    pub async fn record_missing(&self, urls: &[NormalizedUrl], fallback: impl Fn(&NormalizedUrl) -> PageRecord) {
        let mut inner = self.inner.lock().await;
        for url in urls {
            if !inner.recorded.contains(url.as_str()) {
                inner.push_record(fallback(url));
            }
        }
    }

    /// Fold `links`, found on `source_page`, into the global external map.
    pub async fn merge_external(&self, source_page: &str, links: &LinkMap) {
        self.inner.lock().await.merge_external(source_page, links);
    }

    pub async fn merge_broken(&self, source_page: &str, links: &LinkMap) {
        self.inner.lock().await.merge_broken(source_page, links);
    }

    pub async fn page_count(&self) -> usize {
        self.inner.lock().await.pages.len()
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.lock().await.frontier.len()
    }

    pub async fn visited_count(&self) -> usize {
        self.inner.lock().await.frontier.visited_count()
    }

    /// Move the collected pages and link maps out of the state.
    pub async fn drain(&self) -> CrawlSnapshot {
        let mut inner = self.inner.lock().await;
        CrawlSnapshot {
            pages: std::mem::take(&mut inner.pages),
            external: std::mem::take(&mut inner.external),
            broken: std::mem::take(&mut inner.broken),
            found_on: std::mem::take(&mut inner.found_on),
            visited: inner.frontier.visited_count(),
            pending: inner.frontier.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::PageStatus;

    fn url(path: &str) -> NormalizedUrl {
        NormalizedUrl::parse(&format!("https://example.com{}", path)).unwrap()
    }

    fn analyzed(path: &str, internal: &[&str], external: &[&str]) -> AnalyzedPage {
        let mut record = PageRecord::new(url(path).to_string(), PageStatus::Code(200));
        for target in external {
            record
                .external_links
                .insert(target.to_string(), vec!["ext".to_string()]);
        }
        AnalyzedPage {
            record,
            internal_targets: internal.iter().map(|p| url(p)).collect(),
        }
    }

    #[tokio::test]
    async fn test_dispatched_urls_are_not_requeued() {
        let state = CrawlState::new();
        assert!(state.offer_if_unseen(url("/")).await);

        let batch = state.dispatch_batch(5).await;
        assert_eq!(batch, vec![url("/")]);
        assert_eq!(state.pending_count().await, 0);
        assert_eq!(state.visited_count().await, 1);

        // A page linking back to a dispatched URL must not queue it again.
        state.record_page(analyzed("/", &["/", "/a"], &[])).await;
        assert_eq!(state.pending_count().await, 1);
        assert!(!state.offer_if_unseen(url("/")).await);
    }

    #[tokio::test]
    async fn test_record_page_merges_global_links() {
        let state = CrawlState::new();
        state
            .record_page(analyzed("/", &[], &["https://ext.com"]))
            .await;
        let count = state
            .record_page(analyzed("/a", &[], &["https://ext.com"]))
            .await;
        assert_eq!(count, 2);

        let snapshot = state.drain().await;
        assert_eq!(snapshot.external["https://ext.com"], vec!["ext", "ext"]);
        assert_eq!(
            snapshot.found_on["https://ext.com"],
            vec!["https://example.com", "https://example.com/a"]
        );
        assert_eq!(snapshot.pages.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_records_are_ignored() {
        let state = CrawlState::new();
        state.record_page(analyzed("/", &[], &[])).await;
        let count = state.record_page(analyzed("/", &[], &[])).await;
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_record_missing_fills_gaps_only() {
        let state = CrawlState::new();
        state.record_page(analyzed("/a", &[], &[])).await;
        state
            .record_missing(&[url("/a"), url("/b")], |u| PageRecord::with_error(u.to_string()))
            .await;

        let snapshot = state.drain().await;
        let statuses: Vec<(String, PageStatus)> = snapshot
            .pages
            .iter()
            .map(|p| (p.url.clone(), p.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("https://example.com/a".to_string(), PageStatus::Code(200)),
                ("https://example.com/b".to_string(), PageStatus::Error),
            ]
        );
    }

    #[tokio::test]
    async fn test_merge_external_and_broken() {
        let state = CrawlState::new();
        let mut links = LinkMap::new();
        links.insert("https://other.com/gone".to_string(), vec!["Gone".to_string()]);
        state.merge_external("https://example.com/a", &links).await;
        state.merge_broken("https://example.com/a", &links).await;
        state.merge_broken("https://example.com/b", &links).await;

        let snapshot = state.drain().await;
        assert_eq!(snapshot.external["https://other.com/gone"], vec!["Gone"]);
        assert_eq!(snapshot.broken["https://other.com/gone"], vec!["Gone", "Gone"]);
        assert_eq!(
            snapshot.found_on["https://other.com/gone"],
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }
}
