use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::app::Result;
use crate::domain::{Collection, SortDirection, Suggestion, UpsertOp};
use crate::engine::{BatchTask, ImprovementEngine, RunSummary};
use crate::improvement::{persist, seed_page, seed_total, NEWEST_FIRST};
use crate::providers::SuggestionProvider;
use crate::scraper::WebScraper;
use crate::store::{PageQuery, Store};
use crate::suggest::{suggestions_from_content, SuggestConfig};

/// Grows the suggests collection.
pub struct SuggestImprovement {
    engine: ImprovementEngine,
    store: Arc<dyn Store>,
    scraper: WebScraper,
    provider: Arc<dyn SuggestionProvider>,
    config: SuggestConfig,
    pages: Semaphore,
}

impl SuggestImprovement {
    pub fn new(
        engine: ImprovementEngine,
        store: Arc<dyn Store>,
        scraper: WebScraper,
        provider: Arc<dyn SuggestionProvider>,
        config: SuggestConfig,
    ) -> Self {
        let pages = Semaphore::new(config.concurrency.max(1));
        Self {
            engine,
            store,
            scraper,
            provider,
            config,
            pages,
        }
    }

    /// Mines n-gram suggestions out of website text. Two sweeps share the
    /// engine, one from the oldest websites and one from the newest, so
    /// neither end of the collection starves.
    pub async fn content_based(&self, batch_size: usize) -> Result<(RunSummary, RunSummary)> {
        let total = seed_total(self.store.as_ref(), Collection::Websites)?;
        let store = self.store.as_ref();

        let write = |ops| persist(store, Collection::Suggests, ops);

        let oldest = format!("contentBased ({})", SortDirection::Ascending.label());
        let newest = format!("contentBased ({})", SortDirection::Descending.label());
        let summaries = tokio::join!(
            self.engine.process_improvement(
                &oldest,
                batch_size,
                total,
                |task| self.sweep_page(task, SortDirection::Ascending),
                |raw: &String| bulk_op(raw),
                write,
            ),
            self.engine.process_improvement(
                &newest,
                batch_size,
                total,
                |task| self.sweep_page(task, SortDirection::Descending),
                |raw: &String| bulk_op(raw),
                write,
            ),
        );
        Ok(summaries)
    }

    /// Turns the leading `keywords` meta entry of indexed websites into
    /// suggestions.
    pub async fn keyword_based(&self, batch_size: usize) -> Result<RunSummary> {
        let total = seed_total(self.store.as_ref(), Collection::Websites)?;
        let store = self.store.as_ref();

        Ok(self
            .engine
            .process_improvement(
                "keywordBased",
                batch_size,
                total,
                |task| async move {
                    store.distinct_keywords(&PageQuery::new(
                        task.skip,
                        task.batch_size,
                        NEWEST_FIRST,
                    ))
                },
                |raw: &String| bulk_op(raw),
                |ops| persist(store, Collection::Suggests, ops),
            )
            .await)
    }

    async fn sweep_page(&self, task: BatchTask, sort: SortDirection) -> Result<Vec<String>> {
        let seeds = seed_page(self.store.as_ref(), Collection::Websites, task, sort)?;
        let mined = join_all(seeds.iter().map(|seed| self.mine_page(&seed.url))).await;
        Ok(unique(mined.into_iter().flatten()))
    }

    async fn mine_page(&self, url: &str) -> Vec<String> {
        let Ok(_permit) = self.pages.acquire().await else {
            return Vec::new();
        };
        let content = self.scraper.website_content(url).await;
        if content.is_empty() {
            return Vec::new();
        }
        let found = suggestions_from_content(self.provider.as_ref(), &content, &self.config).await;
        debug!("contentBased: {} suggestions from {}", found.len(), url);
        found
    }
}

fn unique(phrases: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    phrases
        .into_iter()
        .filter(|phrase| seen.insert(phrase.clone()))
        .collect()
}

/// Normalizes a phrase and keys it by itself; blank phrases are dropped.
pub fn bulk_op(raw: &str) -> Vec<UpsertOp> {
    Suggestion::new(raw)
        .and_then(|s| UpsertOp::from_payload(s.suggest.as_str(), &s))
        .into_iter()
        .collect()
}
