use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::fetcher::Fetcher;

pub const DEFAULT_WORKERS: usize = 200;

/// Caps in-flight outbound fetches across every caller sharing this value.
///
/// This bound is independent of the engine's batch admission: a single batch
/// may fan out into many page fetches.
#[derive(Clone)]
pub struct ParallelFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    semaphore: Arc<Semaphore>,
}

impl ParallelFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub async fn fetch_one(&self, url: &str) -> String {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!("Fetch limiter closed: {}", e);
                return String::new();
            }
        };
        self.fetcher.fetch_html(url).await
    }

    /// Fetches every URL, waiting for all of them; a failed fetch yields an
    /// empty body for that URL only.
    pub async fn fetch_all<'a, I>(&self, urls: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tasks = urls.into_iter().map(|url| async move {
            let html = self.fetch_one(url).await;
            (url.to_string(), html)
        });
        join_all(tasks).await
    }
}
