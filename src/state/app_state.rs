//! Application state
//!
//! Shared by every request handler: the research pipeline, its history store
//! and the configuration readiness reported by the status endpoint.

use crate::backends::deepseek::DeepSeekClient;
use crate::backends::search::SearchTools;
use crate::backends::{GenerativeBackend, RetrievalBackend};
use crate::config::{Config, ConfigReadiness};
use crate::orchestrator::config::ResearchConfig;
use crate::orchestrator::history::HistoryStore;
use crate::orchestrator::pipeline::ResearchOrchestrator;
use std::sync::Arc;

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Research pipeline
    pub orchestrator: Arc<ResearchOrchestrator>,
    /// Credential status of external services
    pub readiness: ConfigReadiness,
}

impl AppState {
    /// Assemble state from explicit backends
    pub fn new(
        generative: Arc<dyn GenerativeBackend>,
        retrieval: Arc<dyn RetrievalBackend>,
        research: &ResearchConfig,
        readiness: ConfigReadiness,
    ) -> Self {
        let orchestrator =
            ResearchOrchestrator::new(generative, retrieval, research, HistoryStore::new());
        Self {
            orchestrator: Arc::new(orchestrator),
            readiness,
        }
    }

    /// Assemble state with the production backends described by `config`
    pub fn from_config(config: &Config) -> Self {
        // Shared client; providers set their own per-request timeouts
        let client = reqwest::Client::new();
        let generative = Arc::new(DeepSeekClient::new(client.clone(), config.deepseek.clone()));
        let retrieval = Arc::new(SearchTools::new(client, &config.search));
        Self::new(generative, retrieval, &config.research, config.readiness())
    }

    /// Research history
    pub fn history(&self) -> &HistoryStore {
        self.orchestrator.history()
    }
}
