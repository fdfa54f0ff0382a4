//! Wikipedia encyclopedic search
//!
//! Uses the MediaWiki `list=search` API. Snippets come back as HTML and are
//! reduced to plain text.

use crate::backends::RetrievalError;
use crate::orchestrator::types::SearchItem;
use scraper::Html;
use serde::Deserialize;
use std::time::Duration;

/// Wikipedia search client
pub struct WikipediaSearch {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct WikipediaResponse {
    #[serde(default)]
    query: Option<WikipediaQuery>,
}

#[derive(Debug, Deserialize)]
struct WikipediaQuery {
    #[serde(default)]
    search: Vec<WikipediaHit>,
}

#[derive(Debug, Deserialize)]
struct WikipediaHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

impl WikipediaSearch {
    /// Create a client for `base_url` (e.g. `https://en.wikipedia.org`)
    pub fn new(client: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Article URL for `title`
    pub fn article_url(&self, title: &str) -> String {
        let slug = title.replace(' ', "_");
        match reqwest::Url::parse(&self.base_url) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push("wiki").push(&slug);
                }
                url.to_string()
            }
            Err(_) => format!("{}/wiki/{}", self.base_url, slug),
        }
    }

    /// Search articles, at most `max_results`
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchItem>, RetrievalError> {
        let limit = max_results.to_string();
        let resp = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RetrievalError::Request {
                provider: "wikipedia".to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RetrievalError::Status {
                provider: "wikipedia".to_string(),
                status: status.as_u16(),
            });
        }

        let parsed: WikipediaResponse =
            resp.json().await.map_err(|e| RetrievalError::InvalidResponse {
                provider: "wikipedia".to_string(),
                message: e.to_string(),
            })?;

        Ok(parsed
            .query
            .map(|q| q.search)
            .unwrap_or_default()
            .into_iter()
            .take(max_results)
            .map(|hit| {
                let link = self.article_url(&hit.title);
                SearchItem::new(hit.title, link, strip_html(&hit.snippet))
            })
            .collect())
    }
}

/// Plain text of an HTML snippet: tags dropped, entities decoded, whitespace collapsed
fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
