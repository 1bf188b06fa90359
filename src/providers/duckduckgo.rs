use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::app::{Result, TrawlerError};
use crate::providers::{ProvidersConfig, SearchProvider, SuggestionProvider};
use crate::scraper::ScraperConfig;

fn build_client(scraper: &ScraperConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(scraper.timeout())
        .user_agent(scraper.user_agent.as_str())
        .build()?)
}

async fn get_text(client: &Client, endpoint: &str, params: &[(&str, &str)]) -> Result<String> {
    let url = Url::parse_with_params(endpoint, params)?;
    let response = client.get(url).send().await?;
    response.error_for_status_ref()?;
    Ok(response.text().await?)
}

pub struct DuckDuckGoSuggest {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSuggest {
    pub fn new(config: &ProvidersConfig, scraper: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(scraper)?,
            endpoint: config.suggest_endpoint.clone(),
        })
    }
}

#[async_trait]
impl SuggestionProvider for DuckDuckGoSuggest {
    async fn suggest(&self, query: &str) -> Result<Vec<String>> {
        let body = get_text(&self.client, &self.endpoint, &[("q", query), ("type", "list")]).await?;
        parse_suggestions(&body)
    }
}

/// Accepts both the `["q", ["a", "b"]]` list shape and the
/// `[{"phrase": "a"}, ...]` object shape.
pub fn parse_suggestions(body: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let entries = value
        .as_array()
        .ok_or_else(|| TrawlerError::Provider("Unexpected suggestion payload".into()))?;

    if let Some(list) = entries.get(1).and_then(|v| v.as_array()) {
        return Ok(list
            .iter()
            .filter_map(|v| v.as_str())
            .map(String::from)
            .collect());
    }

    Ok(entries
        .iter()
        .filter_map(|entry| entry.get("phrase").and_then(|p| p.as_str()))
        .map(String::from)
        .collect())
}

pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(config: &ProvidersConfig, scraper: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(scraper)?,
            endpoint: config.search_endpoint.clone(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let body = get_text(&self.client, &self.endpoint, &[("q", query)]).await?;
        Ok(parse_search_results(&body, self.max_results))
    }
}

/// Result links from a DuckDuckGo HTML results page, unwrapped from the
/// `uddg` redirect parameter when present.
pub fn parse_search_results(html: &str, max_results: usize) -> Vec<String> {
    let document = ::scraper::Html::parse_document(html);
    let selector = match ::scraper::Selector::parse("a.result__a") {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Invalid search result selector: {:?}", e);
            return Vec::new();
        }
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(unwrap_redirect)
        .take(max_results)
        .collect()
}

fn unwrap_redirect(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let url = Url::parse(&absolute).ok()?;

    let target = url
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
        .unwrap_or(absolute);

    let target = Url::parse(&target).ok()?;
    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}
