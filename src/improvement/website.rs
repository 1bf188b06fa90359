use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::app::Result;
use crate::domain::{Collection, ScrapedRecord};
use crate::engine::{ImprovementEngine, RunSummary};
use crate::improvement::{list_page, persist, record_op, seed_page, seed_total, NEWEST_FIRST};
use crate::providers::SearchProvider;
use crate::scraper::{LinkOptions, WebScraper};
use crate::store::Store;

/// Grows the websites collection.
pub struct WebsiteImprovement {
    engine: ImprovementEngine,
    store: Arc<dyn Store>,
    scraper: WebScraper,
    search: Arc<dyn SearchProvider>,
}

impl WebsiteImprovement {
    pub fn new(
        engine: ImprovementEngine,
        store: Arc<dyn Store>,
        scraper: WebScraper,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            engine,
            store,
            scraper,
            search,
        }
    }

    /// Follows the outgoing links of already indexed websites, newest first.
    pub async fn hyperlink_based(
        &self,
        batch_size: usize,
        include_same_domain: bool,
    ) -> Result<RunSummary> {
        let total = seed_total(self.store.as_ref(), Collection::Websites)?;
        debug!("hyperlinkBased: {} seed websites", total);

        let options = LinkOptions {
            include_same_domain,
            restrict_third_party_domains: false,
        };
        let store = self.store.as_ref();
        let scraper = &self.scraper;

        Ok(self
            .engine
            .process_improvement(
                "hyperlinkBased",
                batch_size,
                total,
                |task| async move {
                    let seeds = seed_page(store, Collection::Websites, task, NEWEST_FIRST)?;
                    let urls = scraper.extracted_urls(&seeds, options).await;
                    debug!(
                        "hyperlinkBased: {} urls extracted from {} websites (skip {})",
                        urls.len(),
                        seeds.len(),
                        task.skip
                    );
                    Ok(scraper.scraped_websites(&urls).await)
                },
                record_op,
                |ops| persist(store, Collection::Websites, ops),
            )
            .await)
    }

    /// Runs stored suggestions through web search and indexes the result
    /// pages.
    pub async fn suggests_based(&self, batch_size: usize) -> Result<RunSummary> {
        let total = seed_total(self.store.as_ref(), Collection::Suggests)?;
        let store = self.store.as_ref();

        Ok(self
            .engine
            .process_improvement(
                "suggestsBased",
                batch_size,
                total,
                |task| async move {
                    let suggestions = seed_page(store, Collection::Suggests, task, NEWEST_FIRST)?;
                    let pages =
                        join_all(suggestions.iter().map(|s| self.process_suggest(&s.url))).await;
                    Ok(pages.into_iter().flatten().collect::<Vec<_>>())
                },
                record_op,
                |ops| persist(store, Collection::Websites, ops),
            )
            .await)
    }

    /// Extracts links from a fixed list of pages and indexes them. The list
    /// length is the total, so this run cannot fail up front.
    pub async fn list_based(
        &self,
        batch_size: usize,
        urls: &[String],
        include_same_domain: bool,
    ) -> RunSummary {
        let options = LinkOptions {
            include_same_domain,
            restrict_third_party_domains: false,
        };
        let store = self.store.as_ref();
        let scraper = &self.scraper;

        self.engine
            .process_improvement(
                "listBased",
                batch_size,
                urls.len(),
                |task| async move {
                    let seeds = list_page(urls, task);
                    let links = scraper.extracted_urls(&seeds, options).await;
                    Ok(scraper.scraped_websites(&links).await)
                },
                record_op,
                |ops| persist(store, Collection::Websites, ops),
            )
            .await
    }

    async fn process_suggest(&self, suggest: &str) -> Vec<ScrapedRecord> {
        let links = match self.search.search(suggest).await {
            Ok(links) => links,
            Err(e) => {
                debug!("Search failed for {:?}: {}", suggest, e);
                return Vec::new();
            }
        };
        self.scraper.scraped_websites(&links).await
    }
}
