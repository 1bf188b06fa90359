use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::app::error::{Result, TrawlerError};
use crate::config::Config;
use crate::engine::{ImprovementEngine, ImprovementObserver, TracingObserver};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelFetcher;
use crate::fetcher::Fetcher;
use crate::domain::Collection;
use crate::improvement::{
    ProviderImprovement, Resource, ResourceImprovement, SuggestImprovement, WebsiteImprovement,
};
use crate::providers::{DuckDuckGoSearch, DuckDuckGoSuggest, SearchProvider, SuggestionProvider};
use crate::scraper::WebScraper;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Wires the store, scraper and providers together and hands out one
/// strategy per collection.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub scraper: WebScraper,
    pub suggestions: Arc<dyn SuggestionProvider>,
    pub search: Arc<dyn SearchProvider>,
    cancel: CancellationToken,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };
        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(store, config)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(Arc::new(SqliteStore::in_memory()?), config)
    }

    fn with_store(store: Arc<SqliteStore>, config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(&config.scraper)?);
        let parallel_fetcher =
            ParallelFetcher::with_workers(fetcher, config.scraper.max_concurrency);
        let suggestions = Arc::new(DuckDuckGoSuggest::new(&config.providers, &config.scraper)?);
        let search = Arc::new(DuckDuckGoSearch::new(&config.providers, &config.scraper)?);

        Ok(Self {
            config,
            store,
            scraper: WebScraper::new(parallel_fetcher),
            suggestions,
            search,
            cancel: CancellationToken::new(),
        })
    }

    /// Cancelling this token stops every engine handed out by this context
    /// at its next batch boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// A fresh engine whose lifecycle events are logged under `name`.
    pub fn engine(&self, name: &str) -> ImprovementEngine {
        let observer: Arc<dyn ImprovementObserver> = Arc::new(TracingObserver::new(name));
        ImprovementEngine::new(&self.config.engine, observer).with_cancellation(self.cancel.clone())
    }

    fn dyn_store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn website_improvement(&self) -> WebsiteImprovement {
        WebsiteImprovement::new(
            self.engine("Website"),
            self.dyn_store(),
            self.scraper.clone(),
            self.search.clone(),
        )
    }

    pub fn suggest_improvement(&self) -> SuggestImprovement {
        SuggestImprovement::new(
            self.engine("Suggest"),
            self.dyn_store(),
            self.scraper.clone(),
            self.suggestions.clone(),
            self.config.suggest.clone(),
        )
    }

    pub fn image_improvement(&self) -> ResourceImprovement {
        self.resource_improvement("Image", Resource::Images)
    }

    pub fn asset_improvement(&self) -> ResourceImprovement {
        self.resource_improvement("Asset", Resource::Assets)
    }

    fn resource_improvement(&self, name: &str, resource: Resource) -> ResourceImprovement {
        ResourceImprovement::new(
            self.engine(name),
            self.dyn_store(),
            self.scraper.clone(),
            resource,
        )
    }

    pub fn news_improvement(&self) -> ProviderImprovement {
        self.provider_improvement("News", Collection::News, &self.config.targets.news)
    }

    pub fn shopping_improvement(&self) -> ProviderImprovement {
        self.provider_improvement("Shopping", Collection::Shopping, &self.config.targets.shopping)
    }

    fn provider_improvement(
        &self,
        name: &str,
        collection: Collection,
        providers: &[String],
    ) -> ProviderImprovement {
        ProviderImprovement::new(
            self.engine(name),
            self.dyn_store(),
            self.scraper.clone(),
            collection,
            providers.to_vec(),
        )
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TrawlerError::Config("Could not find data directory".into()))?;
        let trawler_dir = data_dir.join("trawler");
        std::fs::create_dir_all(&trawler_dir)?;
        Ok(trawler_dir.join("trawler.db"))
    }
}
