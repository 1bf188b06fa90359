//! Page scraping built on the fetcher and the HTML extractor.
//!
//! # Architecture
//!
//! ```text
//! Seed URL → ParallelFetcher → HtmlExtractor → records / links / assets / images
//! ```
//!
//! Every operation here tolerates partial failure: a page that cannot be
//! fetched contributes nothing, and never cancels its siblings.
//!
//! # Usage
//!
//! ```rust,ignore
//! use trawler::scraper::{LinkOptions, WebScraper};
//!
//! let scraper = WebScraper::new(parallel_fetcher);
//! let links = scraper.extracted_urls(&seeds, LinkOptions::default()).await;
//! let records = scraper.scraped_websites(&links).await;
//! ```

mod config;
mod extractor;

pub use config::ScraperConfig;
pub use extractor::{HtmlExtractor, LinkOptions};

use std::collections::HashSet;

use futures::future::join_all;

use crate::domain::{ScrapedAsset, ScrapedImage, ScrapedRecord, Seed};
use crate::fetcher::parallel::ParallelFetcher;

#[derive(Clone)]
pub struct WebScraper {
    fetcher: ParallelFetcher,
}

impl WebScraper {
    pub fn new(fetcher: ParallelFetcher) -> Self {
        Self { fetcher }
    }

    /// Builds a record from already-fetched HTML, without validating it.
    pub fn extract_record(html: &str, url: &str) -> ScrapedRecord {
        let extractor = HtmlExtractor::new(html, url);
        ScrapedRecord {
            url: url.to_string(),
            title: Some(extractor.title()).filter(|t| !t.is_empty()),
            description: extractor.description(),
            meta_data: extractor.meta_data(),
        }
    }

    /// Fetches and extracts one page; `None` unless it has both a title and
    /// a description.
    pub async fn scrape_site(&self, url: &str) -> Option<ScrapedRecord> {
        let html = self.fetcher.fetch_one(url).await;
        if html.is_empty() {
            return None;
        }
        let record = Self::extract_record(&html, url);
        record.is_valid().then_some(record)
    }

    /// Visible body text of a page, empty when it cannot be fetched.
    pub async fn website_content(&self, url: &str) -> String {
        let html = self.fetcher.fetch_one(url).await;
        if html.is_empty() {
            return String::new();
        }
        HtmlExtractor::new(&html, url).text()
    }

    /// Outgoing links of every seed, flattened and deduplicated.
    pub async fn extracted_urls(&self, seeds: &[Seed], options: LinkOptions) -> Vec<String> {
        let pages = self.fetcher.fetch_all(seeds.iter().map(|s| s.url.as_str())).await;

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for (base, html) in pages {
            if html.is_empty() {
                continue;
            }
            for link in HtmlExtractor::new(&html, &base).links(options) {
                if seen.insert(link.clone()) {
                    urls.push(link);
                }
            }
        }
        urls
    }

    pub async fn extracted_assets(&self, seeds: &[Seed]) -> Vec<ScrapedAsset> {
        let pages = self.fetcher.fetch_all(seeds.iter().map(|s| s.url.as_str())).await;
        pages
            .into_iter()
            .filter(|(_, html)| !html.is_empty())
            .flat_map(|(base, html)| HtmlExtractor::new(&html, &base).assets())
            .collect()
    }

    pub async fn extracted_images(&self, seeds: &[Seed]) -> Vec<ScrapedImage> {
        let pages = self.fetcher.fetch_all(seeds.iter().map(|s| s.url.as_str())).await;
        pages
            .into_iter()
            .filter(|(_, html)| !html.is_empty())
            .flat_map(|(base, html)| HtmlExtractor::new(&html, &base).images())
            .collect()
    }

    /// Scrapes every URL and keeps only valid records. Waits for every page;
    /// one failure never cancels the rest.
    pub async fn scraped_websites(&self, urls: &[String]) -> Vec<ScrapedRecord> {
        let results = join_all(urls.iter().map(|url| self.scrape_site(url))).await;
        let records: Vec<ScrapedRecord> = results.into_iter().flatten().collect();
        tracing::debug!("Scraped {} of {} websites", records.len(), urls.len());
        records
    }
}
