//! SerpAPI (Google) web search

use crate::backends::RetrievalError;
use crate::orchestrator::types::SearchItem;
use serde::Deserialize;
use std::time::Duration;

/// SerpAPI client
pub struct SerpApiSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SerpApiSearch {
    /// Create a client
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            base_url,
            timeout,
        }
    }

    /// Google organic results, at most `max_results`
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchItem>, RetrievalError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let num = max_results.to_string();
        let resp = self
            .client
            .get(url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RetrievalError::Request {
                provider: "serpapi".to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                provider: "serpapi".to_string(),
                status: status.as_u16(),
            });
        }

        let parsed: SerpApiResponse = resp.json().await.map_err(|e| RetrievalError::InvalidResponse {
            provider: "serpapi".to_string(),
            message: e.to_string(),
        })?;

        if let Some(error) = parsed.error {
            return Err(RetrievalError::Request {
                provider: "serpapi".to_string(),
                message: error,
            });
        }

        Ok(parsed
            .organic_results
            .into_iter()
            .take(max_results)
            .map(|r| SearchItem::new(r.title, r.link, r.snippet))
            .collect())
    }
}
