use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use trawler::app::{Result, TrawlerError};
use trawler::domain::{BulkWriteResult, Collection, SortDirection, UpsertOp};
use trawler::engine::{EngineConfig, ImprovementEngine, ImprovementEvent, NoopObserver};
use trawler::fetcher::parallel::ParallelFetcher;
use trawler::fetcher::Fetcher;
use trawler::improvement::{
    ProviderImprovement, Resource, ResourceImprovement, SuggestImprovement, WebsiteImprovement,
};
use trawler::providers::{SearchProvider, SuggestionProvider};
use trawler::scraper::WebScraper;
use trawler::store::{Document, PageQuery, SqliteStore, Store};
use trawler::suggest::SuggestConfig;

struct StaticFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch_html(&self, url: &str) -> String {
        self.pages.get(url).cloned().unwrap_or_default()
    }
}

fn scraper(pages: &[(&str, &str)]) -> WebScraper {
    let fetcher = StaticFetcher {
        pages: pages
            .iter()
            .map(|(url, html)| (url.to_string(), html.to_string()))
            .collect(),
    };
    WebScraper::new(ParallelFetcher::with_workers(Arc::new(fetcher), 8))
}

fn engine() -> ImprovementEngine {
    ImprovementEngine::new(&EngineConfig::default(), Arc::new(NoopObserver))
}

fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().unwrap())
}

fn seed(store: &SqliteStore, collection: Collection, key: &str, payload: serde_json::Value) {
    store
        .bulk_write(collection, &[UpsertOp::new(key, payload)])
        .unwrap();
}

/// Seeds a document whose payload is just its natural key.
fn seed_key(store: &SqliteStore, collection: Collection, key: &str) {
    seed(store, collection, key, json!({ collection.natural_key(): key }));
}

fn keys(store: &SqliteStore, collection: Collection) -> Vec<String> {
    let mut keys: Vec<String> = store
        .page(collection, &PageQuery::new(0, 1000, SortDirection::Ascending))
        .unwrap()
        .into_iter()
        .map(|doc| doc.key)
        .collect();
    keys.sort();
    keys
}

fn page(title: &str, description: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{}</title><meta name="description" content="{}"></head>
        <body>{}</body></html>"#,
        title, description, body
    )
}

struct NoSearch;

#[async_trait]
impl SearchProvider for NoSearch {
    async fn search(&self, _query: &str) -> Result<Vec<String>> {
        Err(TrawlerError::Provider("search disabled".into()))
    }
}

struct StaticSearch(HashMap<String, Vec<String>>);

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        Ok(self.0.get(query).cloned().unwrap_or_default())
    }
}

struct EchoSuggestions;

#[async_trait]
impl SuggestionProvider for EchoSuggestions {
    async fn suggest(&self, query: &str) -> Result<Vec<String>> {
        Ok(vec![query.to_uppercase(), format!("{} pdf", query)])
    }
}

#[tokio::test]
async fn test_hyperlink_based_is_idempotent() {
    let store = store();
    seed_key(&store, Collection::Websites, "https://seed.test/");

    let seed_page = page(
        "Seed",
        "Start here",
        r#"<a href="https://a.test/page">a</a>
           <a href="https://b.test/page">b</a>
           <a href="https://seed.test/about">internal</a>"#,
    );
    let a_page = page("A", "Valid page", "");
    let b_page = "<html><head><title>B</title></head></html>";
    let pages = [
        ("https://seed.test/", seed_page.as_str()),
        ("https://a.test/page", a_page.as_str()),
        ("https://b.test/page", b_page),
        ("https://seed.test/about", a_page.as_str()),
    ];

    let website = WebsiteImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Arc::new(NoSearch),
    );

    let first = website.hyperlink_based(1, false).await.unwrap();
    assert_eq!(first.batches_planned, 1);
    assert_eq!(first.written.upserted, 1);
    assert_eq!(
        keys(&store, Collection::Websites),
        vec!["https://a.test/page".to_string(), "https://seed.test/".to_string()]
    );

    let second = website.hyperlink_based(1, false).await.unwrap();
    assert_eq!(second.batches_planned, 2);
    assert_eq!(second.written.upserted, 0);
    assert_eq!(store.count(Collection::Websites).unwrap(), 2);
}

#[tokio::test]
async fn test_hyperlink_based_same_domain_links() {
    let store = store();
    seed_key(&store, Collection::Websites, "https://seed.test/");

    let seed_page = page("Seed", "Start", r#"<a href="https://seed.test/about">about</a>"#);
    let about = page("About", "About us", "");
    let pages = [
        ("https://seed.test/", seed_page.as_str()),
        ("https://seed.test/about", about.as_str()),
    ];
    let website = WebsiteImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Arc::new(NoSearch),
    );

    let excluded = website.hyperlink_based(1, false).await.unwrap();
    assert_eq!(excluded.written.upserted, 0);
    assert_eq!(excluded.batches_empty, 1);

    let included = website.hyperlink_based(1, true).await.unwrap();
    assert_eq!(included.written.upserted, 1);
    assert!(keys(&store, Collection::Websites).contains(&"https://seed.test/about".to_string()));
}

#[tokio::test]
async fn test_first_writer_wins_across_runs() {
    let store = store();
    seed(
        &store,
        Collection::Websites,
        "https://a.test/page",
        json!({ "url": "https://a.test/page", "title": "Original" }),
    );

    let list_page = page("List", "Links", r#"<a href="https://a.test/page">a</a>"#);
    let a_page = page("Changed", "Different now", "");
    let pages = [
        ("https://list.test/", list_page.as_str()),
        ("https://a.test/page", a_page.as_str()),
    ];
    let website = WebsiteImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Arc::new(NoSearch),
    );

    let summary = website
        .list_based(5, &["https://list.test/".to_string()], false)
        .await;
    assert_eq!(summary.written.matched, 1);

    let docs: Vec<Document> = store
        .page(Collection::Websites, &PageQuery::new(0, 10, SortDirection::Ascending))
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].payload["title"], "Original");
}

#[tokio::test]
async fn test_suggests_based_indexes_search_results() {
    let store = store();
    seed_key(&store, Collection::Suggests, "rust");
    seed_key(&store, Collection::Suggests, "broken");

    let results = page("Rust", "A language", "");
    let pages = [("https://www.rust-lang.org/", results.as_str())];
    let search = StaticSearch(HashMap::from([(
        "rust".to_string(),
        vec![
            "https://www.rust-lang.org/".to_string(),
            "https://down.test/".to_string(),
        ],
    )]));
    let website = WebsiteImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Arc::new(search),
    );

    let summary = website.suggests_based(1).await.unwrap();
    assert_eq!(summary.batches_planned, 2);
    assert_eq!(summary.batches_succeeded, 1);
    assert_eq!(summary.batches_empty, 1);
    assert_eq!(
        keys(&store, Collection::Websites),
        vec!["https://www.rust-lang.org/".to_string()]
    );
}

#[tokio::test]
async fn test_content_based_suggestions_from_both_sweeps() {
    let store = store();
    seed_key(&store, Collection::Websites, "https://a.test/");

    let pages = [("https://a.test/", "<html><body><p>Rust async runtime guide</p></body></html>")];
    let suggest = SuggestImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Arc::new(EchoSuggestions),
        SuggestConfig::default(),
    );

    let (oldest, newest) = suggest.content_based(5).await.unwrap();
    let mut written = BulkWriteResult::default();
    written.merge(oldest.written);
    written.merge(newest.written);
    assert_eq!(written.upserted, 2);
    assert_eq!(written.matched, 2);

    assert_eq!(
        keys(&store, Collection::Suggests),
        vec![
            "rust async runtime guide".to_string(),
            "rust async runtime guide pdf".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_keyword_based_uses_leading_keyword() {
    let store = store();
    seed(
        &store,
        Collection::Websites,
        "https://a.test/",
        json!({ "url": "https://a.test/", "metaData": { "keywords": " Rust , systems" } }),
    );
    seed(
        &store,
        Collection::Websites,
        "https://b.test/",
        json!({ "url": "https://b.test/", "metaData": { "keywords": "rust" } }),
    );
    seed_key(&store, Collection::Websites, "https://c.test/");

    let suggest = SuggestImprovement::new(
        engine(),
        store.clone(),
        scraper(&[]),
        Arc::new(EchoSuggestions),
        SuggestConfig::default(),
    );

    let summary = suggest.keyword_based(1).await.unwrap();
    assert_eq!(summary.batches_planned, 3);
    assert_eq!(summary.written.upserted, 1);
    assert_eq!(keys(&store, Collection::Suggests), vec!["rust".to_string()]);
}

#[tokio::test]
async fn test_images_and_assets_from_seed_pages() {
    let store = store();
    seed_key(&store, Collection::Websites, "https://a.test/");
    seed_key(&store, Collection::Websites, "https://down.test/");

    let html = r#"<html><head><link rel="stylesheet" href="/site.css"></head>
        <body><img src="/logo.png" alt="Logo" width="120">
        <a href="/report.pdf">report</a></body></html>"#;
    let pages = [("https://a.test/", html)];

    let images = ResourceImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Resource::Images,
    );
    let summary = images.content_based(1).await.unwrap();
    assert_eq!(summary.batches_planned, 2);
    assert_eq!(keys(&store, Collection::Images), vec!["https://a.test/logo.png".to_string()]);

    let assets = ResourceImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Resource::Assets,
    );
    assets.content_based(1).await.unwrap();
    assert_eq!(
        keys(&store, Collection::Assets),
        vec![
            "https://a.test/report.pdf".to_string(),
            "https://a.test/site.css".to_string(),
        ]
    );

    let docs = store
        .page(Collection::Assets, &PageQuery::new(0, 10, SortDirection::Ascending))
        .unwrap();
    assert!(docs.iter().all(|d| d.payload["parentUrl"] == "https://a.test/"));
}

#[tokio::test]
async fn test_secure_providers_keep_provider_domain_only() {
    let store = store();
    let front = page(
        "News",
        "Front page",
        r#"<a href="https://news.test/story">story</a><a href="https://ads.test/offer">ad</a>"#,
    );
    let story = page("Story", "Something happened", "");
    let offer = page("Offer", "Buy now", "");
    let pages = [
        ("https://news.test/", front.as_str()),
        ("https://news.test/story", story.as_str()),
        ("https://ads.test/offer", offer.as_str()),
    ];

    let news = ProviderImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Collection::News,
        vec!["https://news.test/".to_string()],
    );
    let summary = news.secure_providers_based(10).await;
    assert_eq!(summary.batches_planned, 1);
    assert_eq!(keys(&store, Collection::News), vec!["https://news.test/story".to_string()]);
    assert_eq!(store.count(Collection::Websites).unwrap(), 0);
    assert_eq!(store.count(Collection::Shopping).unwrap(), 0);
}

#[tokio::test]
async fn test_shopping_providers_write_their_own_collection() {
    let store = store();
    let front = page(
        "Shop",
        "Deals",
        r#"<a href="https://shop.test/p/1">one</a><a href="https://shop.test/p/2">two</a>"#,
    );
    let first = page("Kettle", "Boils water", "");
    let second = page("Toaster", "Browns bread", "");
    let pages = [
        ("https://shop.test/", front.as_str()),
        ("https://shop.test/p/1", first.as_str()),
        ("https://shop.test/p/2", second.as_str()),
    ];

    let shopping = ProviderImprovement::new(
        engine(),
        store.clone(),
        scraper(&pages),
        Collection::Shopping,
        vec!["https://shop.test/".to_string(), "https://down.test/".to_string()],
    );
    let summary = shopping.secure_providers_based(1).await;
    assert_eq!(summary.batches_planned, 2);
    assert_eq!(
        keys(&store, Collection::Shopping),
        vec!["https://shop.test/p/1".to_string(), "https://shop.test/p/2".to_string()]
    );
    assert_eq!(store.count(Collection::News).unwrap(), 0);
}

#[tokio::test]
async fn test_lifecycle_events_reach_the_host() {
    let store = store();
    seed_key(&store, Collection::Websites, "https://a.test/");
    let pages = [("https://a.test/", r#"<body><img src="https://cdn.test/x.png"></body>"#)];

    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = ImprovementEngine::new(&EngineConfig::default(), Arc::new(tx));
    let images = ResourceImprovement::new(engine, store.clone(), scraper(&pages), Resource::Images);
    images.content_based(5).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], ImprovementEvent::Start { method } if method == "contentBased"));
    match &events[1] {
        ImprovementEvent::BatchProcessed { operations, batch, .. } => {
            assert_eq!(batch.skip, 0);
            assert_eq!(operations.len(), 1);
            assert_eq!(operations[0].filter, "https://cdn.test/x.png");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(matches!(
        &events[2],
        ImprovementEvent::End { summary, .. } if summary.written.upserted == 1
    ));
}

#[tokio::test]
async fn test_cancelled_engine_writes_nothing() {
    let store = store();
    seed_key(&store, Collection::Websites, "https://a.test/");
    let pages = [("https://a.test/", r#"<body><img src="/x.png"></body>"#)];

    let engine = engine();
    engine.cancellation_token().cancel();
    let images = ResourceImprovement::new(engine, store.clone(), scraper(&pages), Resource::Images);

    let summary = images.content_based(1).await.unwrap();
    assert_eq!(summary.batches_cancelled, 1);
    assert_eq!(store.count(Collection::Images).unwrap(), 0);
}

struct UnreachableStore;

impl Store for UnreachableStore {
    fn count(&self, _collection: Collection) -> Result<u64> {
        Err(TrawlerError::Other("connection refused".into()))
    }

    fn page(&self, _collection: Collection, _query: &PageQuery) -> Result<Vec<Document>> {
        Err(TrawlerError::Other("connection refused".into()))
    }

    fn bulk_write(&self, _collection: Collection, _ops: &[UpsertOp]) -> Result<BulkWriteResult> {
        Err(TrawlerError::Other("connection refused".into()))
    }

    fn distinct_keywords(&self, _query: &PageQuery) -> Result<Vec<String>> {
        Err(TrawlerError::Other("connection refused".into()))
    }
}

#[tokio::test]
async fn test_unreachable_store_is_fatal_at_start() {
    let website = WebsiteImprovement::new(
        engine(),
        Arc::new(UnreachableStore),
        scraper(&[]),
        Arc::new(NoSearch),
    );
    assert!(website.hyperlink_based(5, false).await.is_err());
    assert!(website.suggests_based(5).await.is_err());
}

#[tokio::test]
async fn test_failing_writes_are_dropped_per_batch() {
    let list_page = page("List", "Links", r#"<a href="https://a.test/page">a</a>"#);
    let a_page = page("A", "Valid page", "");
    let pages = [
        ("https://list.test/", list_page.as_str()),
        ("https://a.test/page", a_page.as_str()),
    ];
    let website = WebsiteImprovement::new(
        engine(),
        Arc::new(UnreachableStore),
        scraper(&pages),
        Arc::new(NoSearch),
    );

    let lists = vec!["https://list.test/".to_string(), "https://empty.test/".to_string()];
    let summary = website.list_based(1, &lists, false).await;
    assert_eq!(summary.batches_planned, 2);
    assert_eq!(summary.batches_failed, 1);
    assert_eq!(summary.batches_empty, 1);
    assert_eq!(summary.written, BulkWriteResult::default());
}
