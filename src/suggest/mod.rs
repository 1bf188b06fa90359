//! Suggestion mining from page text.
//!
//! Page text is tokenized, cut into sliding 4-token windows, ranked by
//! frequency, and the top phrases are expanded through a
//! [`SuggestionProvider`].

use std::collections::HashMap;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::providers::SuggestionProvider;

/// Tokens per n-gram.
pub const NGRAM_SIZE: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// Tokens longer than this many characters are dropped (default: 16)
    pub max_token_len: usize,

    /// How many top n-grams are looked up per page (default: 5)
    pub max_suggestions: usize,

    /// Pages fetched and mined at once within one batch (default: 5)
    pub concurrency: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            max_token_len: 16,
            max_suggestions: 5,
            concurrency: 5,
        }
    }
}

/// Lowercased sliding windows of [`NGRAM_SIZE`] tokens over `content`.
pub fn generate_ngrams(content: &str, max_token_len: usize) -> Vec<String> {
    let content = content.to_lowercase();
    let tokens: Vec<&str> = content
        .split_whitespace()
        .filter(|token| token.chars().count() <= max_token_len)
        .collect();

    tokens
        .windows(NGRAM_SIZE)
        .map(|window| window.join(" "))
        .collect()
}

/// The `limit` most frequent n-grams, most frequent first. Ties keep the
/// order in which the n-grams first appeared.
pub fn top_ngrams(ngrams: &[String], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, ngram) in ngrams.iter().enumerate() {
        counts.entry(ngram.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(ngram, (count, first))| (ngram, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(ngram, _, _)| ngram.to_string())
        .collect()
}

/// Looks up each top n-gram of `content` and merges the results. Failed
/// lookups are skipped; partial results are returned as-is.
pub async fn suggestions_from_content(
    provider: &dyn SuggestionProvider,
    content: &str,
    config: &SuggestConfig,
) -> Vec<String> {
    let ngrams = generate_ngrams(content, config.max_token_len);
    let top = top_ngrams(&ngrams, config.max_suggestions);

    let results = join_all(top.iter().map(|ngram| provider.suggest(ngram))).await;

    let mut suggestions = Vec::new();
    for (ngram, result) in top.iter().zip(results) {
        match result {
            Ok(found) => suggestions.extend(found),
            Err(e) => tracing::debug!("Suggestion lookup failed for {:?}: {}", ngram, e),
        }
    }
    suggestions
}
