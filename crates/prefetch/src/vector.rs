//! Concurrent fetch-and-parse pipeline for day-indexed vector payloads.
//!
//! Each locator resolves independently; results are delivered over a channel
//! as they arrive so consumers can render partial data before the whole
//! range has loaded. A failed day is recorded as failed and skipped, it
//! never aborts sibling fetches and is never retried.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use catalog::VectorLocator;
use viewer_common::FeatureCollection;

use crate::fetcher::ObjectFetcher;

/// One completed vector fetch: parsed collection, or `None` on failure.
#[derive(Debug, Clone)]
pub struct VectorArrival {
    pub locator: VectorLocator,
    pub collection: Option<FeatureCollection>,
}

/// Locator-keyed store of parsed vector payloads.
#[derive(Clone)]
pub struct VectorCache {
    entries: Arc<RwLock<HashMap<VectorLocator, Option<FeatureCollection>>>>,
    fetcher: Arc<dyn ObjectFetcher>,
    concurrency: usize,
}

impl VectorCache {
    pub fn new(fetcher: Arc<dyn ObjectFetcher>) -> Self {
        Self::with_concurrency(fetcher, 4)
    }

    pub fn with_concurrency(fetcher: Arc<dyn ObjectFetcher>, concurrency: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch and parse every locator, delivering arrivals as they complete.
    ///
    /// Already-cached locators (including failed ones) are replayed onto the
    /// channel without refetching, so a consumer always observes the full
    /// list. Arrival order is unordered with respect to the input.
    pub fn warm(&self, locators: &[VectorLocator]) -> mpsc::Receiver<VectorArrival> {
        let (tx, rx) = mpsc::channel(locators.len().max(1));

        let entries = self.entries.clone();
        let fetcher = self.fetcher.clone();
        let concurrency = self.concurrency;
        let locators = locators.to_vec();

        tokio::spawn(async move {
            let results = stream::iter(locators)
                .map(|locator| {
                    let entries = entries.clone();
                    let fetcher = fetcher.clone();
                    async move {
                        if let Some(cached) = entries.read().await.get(&locator) {
                            return VectorArrival {
                                locator,
                                collection: cached.clone(),
                            };
                        }

                        let collection = fetch_and_parse(fetcher.as_ref(), &locator).await;
                        entries
                            .write()
                            .await
                            .insert(locator.clone(), collection.clone());
                        VectorArrival {
                            locator,
                            collection,
                        }
                    }
                })
                .buffer_unordered(concurrency);

            futures::pin_mut!(results);
            while let Some(arrival) = results.next().await {
                // Receiver dropped means the range was superseded; the cache
                // keeps whatever already arrived.
                if tx.send(arrival).await.is_err() {
                    break;
                }
            }
        });

        rx
    }

    /// Parsed collection for a locator: `Some(Some(..))` cached,
    /// `Some(None)` failed, `None` not yet fetched.
    pub async fn get(&self, locator: &VectorLocator) -> Option<Option<FeatureCollection>> {
        self.entries.read().await.get(locator).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

async fn fetch_and_parse(
    fetcher: &dyn ObjectFetcher,
    locator: &VectorLocator,
) -> Option<FeatureCollection> {
    let payload = match fetcher.fetch(locator.url()).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(locator = %locator, error = %e, "Vector payload fetch failed");
            return None;
        }
    };

    match serde_json::from_slice::<FeatureCollection>(&payload) {
        Ok(collection) => {
            debug!(locator = %locator, features = collection.len(), "Vector payload cached");
            Some(collection)
        }
        Err(e) => {
            warn!(locator = %locator, error = %e, "Vector payload parse failed");
            None
        }
    }
}
