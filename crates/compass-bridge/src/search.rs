//! Tavily-backed search provider for the job-search pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use compass_core::{CoreError, SearchProvider, SearchSnippet};

const TAVILY_API_URL: &str = "https://api.tavily.com/search";
const DEFAULT_MAX_RESULTS: u8 = 5;

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u8,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchSnippet>,
}

/// Search client over the Tavily API. Stateless; safe to share across turns.
pub struct TavilyClient {
    api_key: String,
    max_results: u8,
    client: reqwest::Client,
}

impl TavilyClient {
    /// Create a client from `TAVILY_API_KEY`. Returns `None` when unset.
    pub fn from_env() -> Option<Self> {
        let key = std::env::var("TAVILY_API_KEY").ok()?.trim().to_string();
        if key.is_empty() {
            return None;
        }
        Some(Self::new(key))
    }

    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            client,
        }
    }

    pub fn with_max_results(mut self, max_results: u8) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait::async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchSnippet>, CoreError> {
        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };
        let res = self
            .client
            .post(TAVILY_API_URL)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Search(format!("request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CoreError::Search(format!("API error {}: {}", status, body)));
        }

        let parsed: SearchResponse = res
            .json()
            .await
            .map_err(|e| CoreError::Search(format!("response parse failed: {}", e)))?;
        debug!(query, results = parsed.results.len(), "search completed");
        Ok(parsed.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_shape_deserializes() {
        let raw = r#"{
            "query": "data scientist jobs in Berlin",
            "results": [
                {"title": "Data Scientist (m/f/d)", "url": "https://jobs.example/1", "content": "Berlin, hybrid.", "score": 0.91},
                {"url": "https://jobs.example/2", "content": "No title field."}
            ],
            "response_time": 1.2
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].title, "Data Scientist (m/f/d)");
        assert_eq!(parsed.results[1].title, "");
    }

    #[test]
    fn missing_results_field_is_empty() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"query": "x"}"#).unwrap();
        assert!(parsed.results.is_empty());
    }
}
