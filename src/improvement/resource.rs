use std::future::Future;
use std::sync::Arc;

use crate::app::Result;
use crate::domain::{Collection, ScrapedAsset, ScrapedImage, Seed, UpsertOp};
use crate::engine::{ImprovementEngine, RunSummary};
use crate::improvement::{persist, seed_page, seed_total, NEWEST_FIRST};
use crate::scraper::WebScraper;
use crate::store::Store;

/// What a [`ResourceImprovement`] pulls out of indexed websites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// `<img>` elements, keyed by `src`.
    Images,
    /// Stylesheets, scripts, fonts and linked documents, keyed by URL.
    Assets,
}

impl Resource {
    pub fn collection(self) -> Collection {
        match self {
            Resource::Images => Collection::Images,
            Resource::Assets => Collection::Assets,
        }
    }
}

pub struct ResourceImprovement {
    engine: ImprovementEngine,
    store: Arc<dyn Store>,
    scraper: WebScraper,
    resource: Resource,
}

impl ResourceImprovement {
    pub fn new(
        engine: ImprovementEngine,
        store: Arc<dyn Store>,
        scraper: WebScraper,
        resource: Resource,
    ) -> Self {
        Self {
            engine,
            store,
            scraper,
            resource,
        }
    }

    /// Collects the resources embedded in indexed websites, newest first.
    pub async fn content_based(&self, batch_size: usize) -> Result<RunSummary> {
        let scraper = &self.scraper;
        match self.resource {
            Resource::Images => {
                self.sweep(
                    batch_size,
                    |seeds| async move { scraper.extracted_images(&seeds).await },
                    image_op,
                )
                .await
            }
            Resource::Assets => {
                self.sweep(
                    batch_size,
                    |seeds| async move { scraper.extracted_assets(&seeds).await },
                    asset_op,
                )
                .await
            }
        }
    }

    async fn sweep<T, E, EF>(
        &self,
        batch_size: usize,
        extract: E,
        map: fn(&T) -> Vec<UpsertOp>,
    ) -> Result<RunSummary>
    where
        E: Fn(Vec<Seed>) -> EF,
        EF: Future<Output = Vec<T>>,
    {
        let total = seed_total(self.store.as_ref(), Collection::Websites)?;
        let store = self.store.as_ref();
        let collection = self.resource.collection();
        let extract = &extract;

        Ok(self
            .engine
            .process_improvement(
                "contentBased",
                batch_size,
                total,
                |task| async move {
                    let seeds = seed_page(store, Collection::Websites, task, NEWEST_FIRST)?;
                    Ok(extract(seeds).await)
                },
                map,
                |ops| persist(store, collection, ops),
            )
            .await)
    }
}

pub fn image_op(image: &ScrapedImage) -> Vec<UpsertOp> {
    if image.src.is_empty() {
        return Vec::new();
    }
    UpsertOp::from_payload(image.src.as_str(), image)
        .into_iter()
        .collect()
}

pub fn asset_op(asset: &ScrapedAsset) -> Vec<UpsertOp> {
    if asset.url.is_empty() {
        return Vec::new();
    }
    UpsertOp::from_payload(asset.url.as_str(), asset)
        .into_iter()
        .collect()
}
