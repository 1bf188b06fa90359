pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::SortDirection;

#[derive(Parser)]
#[command(name = "trawler")]
#[command(about = "Crawls the web into deduplicated search collections", long_about = None)]
pub struct Cli {
    /// Number of parallel page fetches (overrides scraper.max_concurrency)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Database file (default: <data dir>/trawler/trawler.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an improvement strategy against the store
    Improve {
        #[arg(value_enum)]
        strategy: Strategy,

        /// Seeds per batch (default: engine.batch_size)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Also follow links that stay on the seed's own domain
        #[arg(long)]
        include_same_domain: bool,
    },
    /// Import documents from a JSON array file
    Import {
        /// Target collection (websites, suggests, images, assets, news, shopping)
        collection: String,
        /// Path to the JSON file
        path: PathBuf,
    },
    /// Count the documents of a collection
    Count {
        collection: String,
    },
    /// List stored documents by creation time
    List {
        collection: String,

        /// Maximum documents to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Creation order: oldest (asc) or newest (desc)
        #[arg(short, long, default_value_t = SortDirection::Ascending)]
        sort: SortDirection,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Websites: follow outgoing links of indexed websites
    Hyperlinks,
    /// Websites: search stored suggestions and index the results
    Suggests,
    /// Websites: extract links from the configured target lists
    Lists,
    /// Suggests: mine n-grams from website text
    Content,
    /// Suggests: keywords meta tag of indexed websites
    Keywords,
    /// Images embedded in indexed websites
    Images,
    /// Assets referenced by indexed websites
    Assets,
    /// News articles from the configured news targets
    News,
    /// Product pages from the configured shopping targets
    Shopping,
    /// Every strategy at once
    All,
}
