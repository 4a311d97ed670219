use crate::result::PageStatus;
use std::sync::Arc;

/// Progress notifications emitted by the crawler.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    CrawlStarted {
        seed: String,
        root_status: PageStatus,
    },
    BatchStarted {
        batch: usize,
        size: usize,
    },
    PageStarted {
        url: String,
    },
    PageCompleted {
        url: String,
        status: PageStatus,
        pages_done: usize,
        max_pages: usize,
    },
    Cancelled {
        pages_done: usize,
    },
    /// `visited` counts dispatched URLs; `pending` is what the budget or a
    /// cancel left in the frontier.
    CrawlFinished {
        pages: usize,
        visited: usize,
        pending: usize,
    },
}

/// Observer passed to the crawler. Called from worker tasks, so it must be cheap.
pub type EventCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

pub(crate) fn emit(callback: &Option<EventCallback>, event: CrawlEvent) {
    if let Some(callback) = callback {
        callback(event);
    }
}
