use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetcher::parallel::DEFAULT_WORKERS;

/// Configuration for page fetching and scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Maximum concurrent outbound page fetches (default: 200)
    pub max_concurrency: usize,

    /// Request timeout in seconds (default: 15)
    pub timeout_secs: u64,

    /// Bodies larger than this are truncated (default: 5 MiB)
    pub max_body_bytes: usize,

    /// User agent string to send
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_WORKERS,
            timeout_secs: 15,
            max_body_bytes: 5 * 1024 * 1024,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl ScraperConfig {
    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
