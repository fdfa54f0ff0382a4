//! Search dispatch
//!
//! Routes a step's tool to the matching retrieval capability and extracts
//! citation-worthy sources from what comes back.

use crate::backends::{RetrievalBackend, RetrievalError};
use crate::orchestrator::constants::{ORIGIN_WEB, ORIGIN_WIKIPEDIA};
use crate::orchestrator::types::{OriginResults, SearchSource, SearchTool};
use crate::orchestrator::utils::hash_query;
use std::sync::Arc;
use tracing::debug;

/// Routes queries to the retrieval backend
pub struct SearchDispatcher {
    retrieval: Arc<dyn RetrievalBackend>,
    max_sources_per_origin: usize,
}

impl SearchDispatcher {
    /// Create a dispatcher over `retrieval`
    pub fn new(retrieval: Arc<dyn RetrievalBackend>, max_sources_per_origin: usize) -> Self {
        Self {
            retrieval,
            max_sources_per_origin,
        }
    }

    /// Run one query with the given tool.
    ///
    /// Single-origin tools wrap their items under the matching origin tag.
    pub async fn dispatch_query(
        &self,
        tool: SearchTool,
        query: &str,
    ) -> Result<OriginResults, RetrievalError> {
        debug!(
            tool = tool.as_str(),
            query_hash = %hash_query(query),
            "Dispatching search"
        );
        let results = match tool {
            SearchTool::Comprehensive => self.retrieval.comprehensive(query).await?,
            SearchTool::PrimaryWeb => {
                OriginResults::single(ORIGIN_WEB, self.retrieval.web(query).await?)
            }
            SearchTool::Encyclopedic => {
                OriginResults::single(ORIGIN_WIKIPEDIA, self.retrieval.encyclopedic(query).await?)
            }
        };
        debug!(
            tool = tool.as_str(),
            result_count = results.total_items(),
            "Search dispatched"
        );
        Ok(results)
    }

    /// Sources for `query`, capped per origin
    pub fn extract_sources(&self, results: &OriginResults, query: &str) -> Vec<SearchSource> {
        extract_sources(results, query, self.max_sources_per_origin)
    }
}

/// For each origin, the first `per_origin` items that have both a title and a link
pub fn extract_sources(
    results: &OriginResults,
    query: &str,
    per_origin: usize,
) -> Vec<SearchSource> {
    results
        .iter()
        .flat_map(|(origin, items)| {
            items
                .iter()
                .filter(|item| item.is_citable())
                .take(per_origin)
                .map(move |item| SearchSource {
                    title: item.title.clone(),
                    link: item.link.clone(),
                    source: origin.to_string(),
                    query: query.to_string(),
                })
        })
        .collect()
}

/// Concatenate per-origin lists across several result maps.
///
/// Origins keep first-seen order; items keep their order within each map.
pub fn merge_result_maps<'a>(maps: impl IntoIterator<Item = &'a OriginResults>) -> OriginResults {
    let mut merged = OriginResults::new();
    for map in maps {
        for (origin, items) in map.iter() {
            merged
                .entry_or_default(origin)
                .extend(items.iter().cloned());
        }
    }
    merged
}
