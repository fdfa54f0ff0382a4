//! Search tools
//!
//! Production [`RetrievalBackend`] composed from the configured providers.
//! Provider failures are logged and absorbed: every capability resolves to a
//! (possibly empty) result list so one bad provider never fails a step.

pub mod serpapi;
pub mod tavily;
pub mod wikipedia;

use crate::backends::{RetrievalBackend, RetrievalError};
use crate::config::SearchConfig;
use crate::orchestrator::constants::{ORIGIN_WEB, ORIGIN_WIKIPEDIA};
use crate::orchestrator::types::{OriginResults, SearchItem};
use crate::orchestrator::utils::hash_query;
use async_trait::async_trait;
use serpapi::SerpApiSearch;
use std::time::Duration;
use tavily::TavilySearch;
use tracing::{debug, warn};
use wikipedia::WikipediaSearch;

/// Results requested from a web provider for a plain web search
const WEB_MAX_RESULTS: usize = 8;

/// Results requested from Tavily inside a comprehensive search
const COMPREHENSIVE_WEB_MAX_RESULTS: usize = 6;

/// Results requested from Wikipedia
const WIKIPEDIA_MAX_RESULTS: usize = 5;

/// Retrieval backend over Tavily, SerpAPI and Wikipedia
pub struct SearchTools {
    tavily: Option<TavilySearch>,
    serpapi: Option<SerpApiSearch>,
    wikipedia: WikipediaSearch,
    wikipedia_enabled: bool,
}

impl SearchTools {
    /// Build the providers that have credentials in `config`
    pub fn new(client: reqwest::Client, config: &SearchConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            tavily: config.tavily_api_key.clone().map(|key| {
                TavilySearch::new(client.clone(), key, config.tavily_base_url.clone(), timeout)
            }),
            serpapi: config.serpapi_api_key.clone().map(|key| {
                SerpApiSearch::new(client.clone(), key, config.serpapi_base_url.clone(), timeout)
            }),
            wikipedia: WikipediaSearch::new(client, config.wikipedia_url(), timeout),
            wikipedia_enabled: config.wikipedia_enabled,
        }
    }

    /// Web results: SerpAPI first, Tavily when SerpAPI is missing or comes back empty
    async fn web_items(&self, query: &str) -> Vec<SearchItem> {
        if let Some(serpapi) = &self.serpapi {
            let items = absorb("serpapi", query, serpapi.search(query, WEB_MAX_RESULTS).await);
            if !items.is_empty() || self.tavily.is_none() {
                return items;
            }
            debug!(query_hash = %hash_query(query), "SerpAPI returned nothing, falling back to Tavily");
        }
        match &self.tavily {
            Some(tavily) => absorb("tavily", query, tavily.search(query, WEB_MAX_RESULTS).await),
            None => {
                warn!("No web search provider configured");
                Vec::new()
            }
        }
    }

    async fn wikipedia_items(&self, query: &str) -> Vec<SearchItem> {
        absorb(
            "wikipedia",
            query,
            self.wikipedia.search(query, WIKIPEDIA_MAX_RESULTS).await,
        )
    }
}

fn absorb(
    provider: &str,
    query: &str,
    result: Result<Vec<SearchItem>, RetrievalError>,
) -> Vec<SearchItem> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(provider = provider, query_hash = %hash_query(query), error = %e, "Search provider failed");
            Vec::new()
        }
    }
}

#[async_trait]
impl RetrievalBackend for SearchTools {
    async fn comprehensive(&self, query: &str) -> Result<OriginResults, RetrievalError> {
        let web = match &self.tavily {
            Some(tavily) => absorb(
                "tavily",
                query,
                tavily.search(query, COMPREHENSIVE_WEB_MAX_RESULTS).await,
            ),
            None => self.web_items(query).await,
        };
        let encyclopedic = if self.wikipedia_enabled {
            self.wikipedia_items(query).await
        } else {
            Vec::new()
        };

        let mut results = OriginResults::new();
        results.insert(ORIGIN_WEB, web);
        results.insert(ORIGIN_WIKIPEDIA, encyclopedic);
        Ok(results)
    }

    async fn web(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
        Ok(self.web_items(query).await)
    }

    async fn encyclopedic(&self, query: &str) -> Result<Vec<SearchItem>, RetrievalError> {
        Ok(self.wikipedia_items(query).await)
    }
}
