//! Narrow interface to the remote object store.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use viewer_common::{ViewerError, ViewerResult};

/// Fetches a raw payload from a locator URL.
///
/// The viewer treats remote storage as an external collaborator behind this
/// seam; tests substitute an in-memory implementation.
#[async_trait]
pub trait ObjectFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> ViewerResult<Bytes>;
}

/// HTTP-backed fetcher for the object store.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with its own connection pool.
    pub fn new() -> ViewerResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ViewerError::ConfigError(format!("HTTP client build failed: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> ViewerResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ViewerError::Fetch {
                locator: url.to_string(),
                message: e.to_string(),
            })?;

        let response = response
            .error_for_status()
            .map_err(|e| ViewerError::Fetch {
                locator: url.to_string(),
                message: e.to_string(),
            })?;

        response.bytes().await.map_err(|e| ViewerError::Fetch {
            locator: url.to_string(),
            message: e.to_string(),
        })
    }
}

pub mod stub {
    //! In-memory fetcher for cache and pipeline tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Serves canned payloads; URLs in `failing` always error.
    pub struct StubFetcher {
        payloads: Mutex<HashMap<String, Bytes>>,
        failing: Mutex<Vec<String>>,
        pub fetch_count: AtomicU64,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self {
                payloads: Mutex::new(HashMap::new()),
                failing: Mutex::new(Vec::new()),
                fetch_count: AtomicU64::new(0),
            }
        }

        pub fn insert(&self, url: &str, payload: impl Into<Bytes>) {
            self.payloads
                .lock()
                .unwrap()
                .insert(url.to_string(), payload.into());
        }

        pub fn fail(&self, url: &str) {
            self.failing.lock().unwrap().push(url.to_string());
        }

        pub fn fetches(&self) -> u64 {
            self.fetch_count.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl ObjectFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> ViewerResult<Bytes> {
            self.fetch_count.fetch_add(1, Ordering::Relaxed);

            if self.failing.lock().unwrap().iter().any(|u| u == url) {
                return Err(ViewerError::Fetch {
                    locator: url.to_string(),
                    message: "stubbed failure".to_string(),
                });
            }

            self.payloads
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| ViewerError::Fetch {
                    locator: url.to_string(),
                    message: "404 not found".to_string(),
                })
        }
    }
}
