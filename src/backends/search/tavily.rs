//! Tavily web search

use crate::backends::RetrievalError;
use crate::orchestrator::types::SearchItem;
use crate::orchestrator::utils::clip_chars;
use serde::Deserialize;
use std::time::Duration;

/// Snippets longer than this are clipped
const SNIPPET_MAX_CHARS: usize = 300;

/// Tavily search API client
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl TavilySearch {
    /// Create a client
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            api_key,
            base_url,
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }

    /// Search the web, returning at most `max_results` items
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchItem>, RetrievalError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "basic",
            "max_results": max_results,
            "include_answer": false,
            "include_raw_content": false,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RetrievalError::Request {
                provider: "tavily".to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                provider: "tavily".to_string(),
                status: status.as_u16(),
            });
        }

        let parsed: TavilySearchResponse =
            resp.json().await.map_err(|e| RetrievalError::InvalidResponse {
                provider: "tavily".to_string(),
                message: e.to_string(),
            })?;

        Ok(parsed
            .results
            .into_iter()
            .take(max_results)
            .map(|r| {
                SearchItem::new(
                    r.title.unwrap_or_default(),
                    r.url,
                    clip_chars(&r.content.unwrap_or_default(), SNIPPET_MAX_CHARS, "..."),
                )
            })
            .collect())
    }
}
