//! # Trawler
//!
//! A small search-index builder: it crawls web pages, extracts structured
//! signals and incrementally grows deduplicated collections of websites,
//! suggestions, images, assets, news and shopping pages.
//!
//! ## Architecture
//!
//! ```text
//! Store (seeds) → Scraper (Fetcher + HtmlExtractor) → Engine → Store (upserts)
//! ```
//!
//! - [`engine`]: batch orchestration under bounded concurrency
//! - [`improvement`]: strategies plugging produce/map/write into the engine
//! - [`scraper`]: page fetching and HTML extraction
//! - [`store`]: SQLite persistence with insert-if-absent writes
//!
//! ## Quick Start
//!
//! ```bash
//! # Seed the store from an export
//! trawler import websites websites.json
//!
//! # Follow links out of every indexed website
//! trawler improve hyperlinks --batch-size 5
//!
//! # Run every strategy, Ctrl-C stops at the next batch boundary
//! trawler improve all
//!
//! # Inspect
//! trawler count websites
//! trawler list websites --sort newest
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// scraper, providers and one engine per strategy.
pub mod app;

/// Command-line interface using clap.
///
/// - `improve <strategy>` - Run one strategy, or `all` of them
/// - `import <collection> <file>` - Load a JSON export
/// - `count <collection>` / `list <collection>` - Inspect the store
pub mod cli;

/// Configuration loaded from `~/.config/trawler/config.toml`.
pub mod config;

/// Core domain models and write operations.
///
/// - [`Seed`](domain::Seed): a stored URL used as a crawl starting point
/// - [`ScrapedRecord`](domain::ScrapedRecord), [`ScrapedAsset`](domain::ScrapedAsset),
///   [`ScrapedImage`](domain::ScrapedImage), [`Suggestion`](domain::Suggestion): candidates
/// - [`UpsertOp`](domain::UpsertOp): idempotent insert-if-absent keyed by a natural key
pub mod domain;

/// The improvement engine.
///
/// - [`ImprovementEngine`](engine::ImprovementEngine): windowed, semaphore-bounded batches
/// - [`ImprovementEvent`](engine::ImprovementEvent): start / batch processed / end
pub mod engine;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait returning HTML, empty on failure
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelFetcher`](fetcher::parallel::ParallelFetcher): Concurrent fetching with semaphore
pub mod fetcher;

/// Improvement strategies, one per target collection.
pub mod improvement;

/// Suggestion and search providers.
pub mod providers;

/// Page scraping built on [`fetcher`] and an HTML extractor.
pub mod scraper;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// N-gram suggestion mining.
pub mod suggest;
