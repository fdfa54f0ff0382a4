//! Command-line research runner
//! Runs one research query through the full pipeline and prints progress.
//! Utility binary, not part of the server.
//!
//! Usage:
//!   research-cli --check            report which API keys are configured
//!   research-cli [--json] <query>   run a query; --json prints raw SSE frames

use deep_research_backend::api::streaming::sse_frame;
use deep_research_backend::config::Config;
use deep_research_backend::orchestrator::types::{EventKind, StepStatus};
use deep_research_backend::state::AppState;
use futures_util::{pin_mut, StreamExt};
use std::env;
use std::sync::Arc;

fn print_check(config: &Config) {
    let readiness = config.readiness();
    let mark = |ok: bool| if ok { "✓" } else { "✗" };
    println!("Configuration check:");
    println!("   {} DEEPSEEK_API_KEY", mark(readiness.deepseek));
    println!("   {} TAVILY_API_KEY", mark(readiness.tavily));
    println!("   {} SERPAPI_API_KEY", mark(readiness.serpapi));
    println!(
        "   {} Wikipedia search ({})",
        mark(readiness.wikipedia),
        config.search.wikipedia_lang
    );
    if !readiness.deepseek {
        println!("\n   Without DEEPSEEK_API_KEY the default plan and fallback report are used.");
    }
    if !readiness.has_web_search() {
        println!("   Without TAVILY_API_KEY or SERPAPI_API_KEY every search returns no results.");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut json_output = false;
    let mut check_only = false;
    let mut words = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--json" => json_output = true,
            "--check" => check_only = true,
            _ => words.push(arg),
        }
    }

    let config = Config::from_env();
    config.research.validate()?;

    if check_only {
        print_check(&config);
        return Ok(());
    }

    let query = words.join(" ");
    if query.trim().is_empty() {
        eprintln!("Usage: research-cli [--json] <query>");
        eprintln!("       research-cli --check");
        return Err("missing query".into());
    }

    let state = AppState::from_config(&config);
    let events = Arc::clone(&state.orchestrator).run(query.trim().to_string());
    pin_mut!(events);

    let mut failed = false;
    while let Some(event) = events.next().await {
        if json_output {
            print!("{}", sse_frame(&event));
            continue;
        }
        match event.kind {
            EventKind::Plan => {
                println!("▶ {}", event.message);
                if let Some(plan) = event.plan_payload() {
                    for step in plan.iter() {
                        println!("   {}. {} ({} queries)", step.step, step.title, step.search_queries.len());
                    }
                }
            }
            EventKind::StepStart => println!("\n▶ {}", event.message),
            EventKind::StepComplete => {
                let ok = event
                    .step_result_payload()
                    .map(|r| r.status() == StepStatus::Completed)
                    .unwrap_or(false);
                println!("   {} {}", if ok { "✓" } else { "✗" }, event.message);
            }
            EventKind::ReportComplete => {
                println!("\n✓ {}\n", event.message);
                if let Some(record) = event.record_payload() {
                    println!("{}", record.report);
                }
            }
            EventKind::Error => {
                eprintln!("\n✗ {}", event.message);
                failed = true;
            }
            _ => println!("   {}", event.message),
        }
    }

    if failed {
        return Err("research run failed".into());
    }
    Ok(())
}
