pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

/// Retrieves raw HTML for a URL.
///
/// Implementations never fail outward: an empty string means the page could
/// not be fetched (timeout, DNS, non-2xx, ...). The failure is logged by the
/// implementation.
#[async_trait]
pub trait Fetcher {
    async fn fetch_html(&self, url: &str) -> String;
}
