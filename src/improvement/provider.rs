use std::sync::Arc;

use crate::domain::Collection;
use crate::engine::{ImprovementEngine, RunSummary};
use crate::improvement::{list_page, persist, record_op};
use crate::scraper::{LinkOptions, WebScraper};
use crate::store::Store;

/// Indexes pages linked from a fixed list of trusted front pages (news
/// outlets, shops) into one collection.
pub struct ProviderImprovement {
    engine: ImprovementEngine,
    store: Arc<dyn Store>,
    scraper: WebScraper,
    collection: Collection,
    providers: Vec<String>,
}

impl ProviderImprovement {
    pub fn new(
        engine: ImprovementEngine,
        store: Arc<dyn Store>,
        scraper: WebScraper,
        collection: Collection,
        providers: Vec<String>,
    ) -> Self {
        Self {
            engine,
            store,
            scraper,
            collection,
            providers,
        }
    }

    /// Scrapes the links of each provider that stay on the provider's own
    /// domain.
    pub async fn secure_providers_based(&self, batch_size: usize) -> RunSummary {
        let options = LinkOptions {
            include_same_domain: true,
            restrict_third_party_domains: true,
        };
        let store = self.store.as_ref();
        let scraper = &self.scraper;
        let providers = self.providers.as_slice();
        let collection = self.collection;

        self.engine
            .process_improvement(
                "secureProviders",
                batch_size,
                providers.len(),
                |task| async move {
                    let seeds = list_page(providers, task);
                    let urls = scraper.extracted_urls(&seeds, options).await;
                    tracing::debug!(
                        "secureProviders: {} links from {} providers (skip {})",
                        urls.len(),
                        seeds.len(),
                        task.skip
                    );
                    Ok(scraper.scraped_websites(&urls).await)
                },
                record_op,
                |ops| persist(store, collection, ops),
            )
            .await
    }
}
