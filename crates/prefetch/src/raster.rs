//! Fire-and-forget background loading of raster frames.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use catalog::FrameLocator;

use crate::fetcher::ObjectFetcher;

/// State of one raster frame in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterEntry {
    /// Fetch spawned, payload not yet arrived.
    Loading,
    /// Payload cached.
    Loaded(Bytes),
    /// Fetch failed; rendered degraded, never retried.
    Failed,
}

/// Locator-keyed raster payload store.
///
/// `warm` is idempotent: a locator that already has an entry (in any state)
/// spawns no new fetch. Entries are never evicted; the cache lifetime is the
/// viewer session and its size is bounded by the date ranges the UI allows.
#[derive(Clone)]
pub struct RasterCache {
    entries: Arc<RwLock<HashMap<FrameLocator, RasterEntry>>>,
    fetcher: Arc<dyn ObjectFetcher>,
}

impl RasterCache {
    pub fn new(fetcher: Arc<dyn ObjectFetcher>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            fetcher,
        }
    }

    /// Trigger background loads for every locator not already present.
    ///
    /// Returns the number of fetches spawned. Completion order is not
    /// guaranteed to match request order; each completion writes back under
    /// its own locator key.
    pub async fn warm(&self, locators: &[FrameLocator]) -> usize {
        let mut spawned = 0;
        let mut entries = self.entries.write().await;

        for locator in locators {
            if entries.contains_key(locator) {
                continue;
            }
            entries.insert(locator.clone(), RasterEntry::Loading);
            spawned += 1;

            let cache = self.entries.clone();
            let fetcher = self.fetcher.clone();
            let locator = locator.clone();
            tokio::spawn(async move {
                let entry = match fetcher.fetch(locator.url()).await {
                    Ok(payload) => {
                        debug!(locator = %locator, bytes = payload.len(), "Raster frame cached");
                        RasterEntry::Loaded(payload)
                    }
                    Err(e) => {
                        // Degraded display, not a propagated error.
                        warn!(locator = %locator, error = %e, "Raster frame load failed");
                        RasterEntry::Failed
                    }
                };
                cache.write().await.insert(locator, entry);
            });
        }

        spawned
    }

    /// Cached payload for a locator, if loaded.
    pub async fn get(&self, locator: &FrameLocator) -> Option<Bytes> {
        match self.entries.read().await.get(locator) {
            Some(RasterEntry::Loaded(payload)) => Some(payload.clone()),
            _ => None,
        }
    }

    /// Entry state for a locator.
    pub async fn status(&self, locator: &FrameLocator) -> Option<RasterEntry> {
        self.entries.read().await.get(locator).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
