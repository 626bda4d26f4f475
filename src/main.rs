mod config;
mod domain;
mod evaluator;
mod exchanges;
mod executor;
mod flash_loan;
mod ledger;
mod quote;
mod searcher;
mod simulation;
mod storage;

use config::Config;
use searcher::{Searcher, SearcherConfig};
use simulation::Scenario;
use std::env;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

fn parse_config_path() -> String {
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

fn has_flag(flag: &str) -> bool {
    env::args().skip(1).any(|arg| arg == flag)
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Runs the built-in two-pool scenario once and logs the outcome.
fn run_reference_scenario() {
    let mut sim = match Scenario::reference().build() {
        Ok(sim) => sim,
        Err(e) => {
            error!(error = %e, "Failed to build reference scenario");
            return;
        }
    };

    match sim.run() {
        Ok(Some(result)) => info!(
            success = result.success(),
            profit = %result.realized_profit(),
            state = %result.final_state(),
            "Reference scenario executed"
        ),
        Ok(None) => info!("Reference scenario has no opportunity"),
        Err(e) => error!(error = %e, "Reference scenario failed"),
    }
}

#[tokio::main]
async fn main() {
    if has_flag("--reference") {
        init_tracing(None);
        run_reference_scenario();
        return;
    }

    let config_path = parse_config_path();

    let cfg = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config {}: {}", config_path, e);
            return;
        }
    };

    init_tracing(cfg.app.log_level.as_deref());

    let searcher = match Searcher::build(SearcherConfig {
        app_config: cfg,
        dry_run: has_flag("--dry-run"),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
    .await
    {
        Ok(searcher) => searcher,
        Err(e) => {
            error!(error = %e, "Failed to create searcher");
            return;
        }
    };

    info!(config = %config_path, "Searcher initialized");

    if has_flag("--once") {
        for result in searcher.run_once().await {
            info!(
                id = %result.opportunity_id(),
                pair = %result.pair(),
                success = result.success(),
                profit = %result.realized_profit(),
                state = %result.final_state(),
                reason = ?result.reason(),
                "Execution result"
            );
        }
        return;
    }

    if let Err(e) = searcher.start().await {
        error!(error = %e, "Searcher error");
    }

    let _ = searcher.stop().await;
}
