//! Lyceum - knowledge base, exam and realtime chat server

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use lyceum::{config::Args, logging, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Lyceum");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Log format: {:?}", args.log_format);
    info!("Exam session TTL: {}s", args.exam_session_ttl_secs);
    match &args.taxonomy_file {
        Some(path) => info!("Taxonomy: {}", path.display()),
        None => info!("Taxonomy: built-in"),
    }
    info!("======================================");

    let state = match AppState::new(args) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to load store: {}", e);
            std::process::exit(1);
        }
    };

    let stats = state.store.stats();
    info!("Loaded {} knowledge areas", stats.taxonomy_topics);

    server::run(state).await?;

    info!("Lyceum stopped");
    Ok(())
}
