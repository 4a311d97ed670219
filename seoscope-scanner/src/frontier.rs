//! Pending queue and visited ledger.
//!
//! URLs leave the queue in the order they were first offered (FIFO), which
//! makes traversal breadth-first and reproducible for a given site. A URL is
//! never in the queue and the ledger at the same time.

use crate::normalize::NormalizedUrl;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<NormalizedUrl>,
    queued: HashSet<NormalizedUrl>,
    visited: HashSet<NormalizedUrl>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `url` unless it was already visited or queued. Returns whether it was added.
    pub fn offer(&mut self, url: NormalizedUrl) -> bool {
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Remove up to `n` URLs from the front of the queue.
    ///
    /// Taken URLs are in neither set until [`Frontier::mark_visited`] is called.
    pub fn take_batch(&mut self, n: usize) -> Vec<NormalizedUrl> {
        let count = n.min(self.queue.len());
        let batch: Vec<NormalizedUrl> = self.queue.drain(..count).collect();
        for url in &batch {
            self.queued.remove(url);
        }
        batch
    }

    pub fn mark_visited(&mut self, url: NormalizedUrl) {
        self.queued.remove(&url);
        self.visited.insert(url);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
