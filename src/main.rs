//! Deep Research Backend
//!
//! HTTP server for multi-step research runs: plan, search, analyze, report,
//! with progress streamed to the client as Server-Sent Events.

use anyhow::Context;
use deep_research_backend::{api, config::Config, state::AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = Config::from_env();
    config.research.validate()?;

    let readiness = config.readiness();
    info!(
        deepseek = readiness.deepseek,
        tavily = readiness.tavily,
        serpapi = readiness.serpapi,
        wikipedia = readiness.wikipedia,
        model = %config.deepseek.model,
        "Configuration loaded"
    );
    if !readiness.deepseek {
        warn!("DEEPSEEK_API_KEY is not set; plans and reports will use fallbacks");
    }
    if !readiness.has_web_search() {
        warn!("No web search provider configured (TAVILY_API_KEY / SERPAPI_API_KEY)");
    }

    let app = api::app(Arc::new(AppState::from_config(&config)));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        addr = %addr,
        version = env!("CARGO_PKG_VERSION"),
        "Deep research backend listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = shutdown_signal().await;
            info!(signal, "Shutdown requested, draining connections");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM, returning which one arrived.
///
/// A handler that cannot be installed never resolves, so the other signal
/// still works.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl_c",
            Err(e) => {
                warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "sigterm"
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}
