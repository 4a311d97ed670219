use crate::fetch::Fetcher;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Liveness probe for discovered links.
///
/// A link is broken when the probe errors (timeout, connection, DNS) or
/// answers with a status of 400 or above. Without memoization every
/// occurrence is probed again; with it the first verdict for a target URL is
/// reused for the rest of the crawl.
pub struct LinkChecker<F> {
    fetcher: Arc<F>,
    cache: Option<Mutex<HashMap<String, bool>>>,
}

impl<F: Fetcher> LinkChecker<F> {
    pub fn new(fetcher: Arc<F>, memoize: bool) -> Self {
        Self {
            fetcher,
            cache: memoize.then(|| Mutex::new(HashMap::new())),
        }
    }

    pub async fn is_broken(&self, url: &str) -> bool {
        if let Some(cache) = &self.cache
            && let Some(broken) = cache.lock().await.get(url)
        {
            return *broken;
        }

        let broken = match self.fetcher.probe(url).await {
            Ok(status) => status >= 400,
            Err(e) => {
                debug!("Probe failed: {}", e);
                true
            }
        };

        if let Some(cache) = &self.cache {
            cache.lock().await.insert(url.to_string(), broken);
        }
        broken
    }
}
