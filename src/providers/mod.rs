//! External lookups: phrase suggestions and web search.

pub mod duckduckgo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::Result;

pub use duckduckgo::{DuckDuckGoSearch, DuckDuckGoSuggest};

/// Expands a phrase into related search suggestions.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Vec<String>>;
}

/// Returns result links for a search query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Autocomplete endpoint returning `["query", ["suggestion", ...]]`
    pub suggest_endpoint: String,

    /// HTML search endpoint taking a `q` parameter
    pub search_endpoint: String,

    /// Result links kept per search (default: 10)
    pub max_results: usize,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            suggest_endpoint: "https://duckduckgo.com/ac/".to_string(),
            search_endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 10,
        }
    }
}
