use serde::{Deserialize, Serialize};

/// Curated front pages for the list-based and secure-provider strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    pub news: Vec<String>,
    pub shopping: Vec<String>,
    pub devs: Vec<String>,
    pub wikipedia: Vec<String>,
}

fn owned(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|url| url.to_string()).collect()
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            news: owned(&[
                "https://www.reuters.com/",
                "https://apnews.com/",
                "https://www.bbc.com/news",
                "https://www.theguardian.com/international",
                "https://www.npr.org/",
            ]),
            shopping: owned(&[
                "https://www.ebay.com/",
                "https://www.etsy.com/",
                "https://www.bestbuy.com/",
                "https://www.ikea.com/",
            ]),
            devs: owned(&[
                "https://news.ycombinator.com/",
                "https://lobste.rs/",
                "https://dev.to/",
                "https://this-week-in-rust.org/",
                "https://developer.mozilla.org/en-US/",
            ]),
            wikipedia: owned(&[
                "https://en.wikipedia.org/wiki/Main_Page",
                "https://en.wikipedia.org/wiki/Portal:Current_events",
                "https://en.wikipedia.org/wiki/Special:Random",
            ]),
        }
    }
}

impl TargetsConfig {
    /// Every list flattened in a fixed order: devs, news, shopping, wikipedia.
    pub fn all(&self) -> Vec<String> {
        self.devs
            .iter()
            .chain(&self.news)
            .chain(&self.shopping)
            .chain(&self.wikipedia)
            .cloned()
            .collect()
    }
}
