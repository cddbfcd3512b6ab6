// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Despensa Web API
//!
//! Standalone server exposing the shared lists over HTTP and WebSocket.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use despensa::ai::OllamaClassifier;
use despensa::categorize::{CategoryMatcher, Classifier};
use despensa::config::AppConfig;
use despensa::service::ListService;
use despensa::store::{ListStore, SqliteStore};
use despensa::Result;

#[derive(Parser, Debug)]
#[command(name = "despensa-web")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.2.0")]
#[command(about = "Despensa Web API Server")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Despensa Web API v1.2.0");

    // Load config
    let mut config = AppConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.web.host = host;
    }
    if let Some(port) = args.port {
        config.web.port = port;
    }

    if !config.web.enabled {
        warn!("Web API disabled in configuration");
        return Ok(());
    }

    // Initialize store
    let store = SqliteStore::open(&config.database.path)?
        .with_backups(config.lists.backup_on_write);
    info!("Database: {}", config.database.path);

    // Build the classification stack
    let classifier =
        OllamaClassifier::from_config(&config).map(|c| Arc::new(c) as Arc<dyn Classifier>);
    match &classifier {
        Some(_) => info!(
            "AI classification: {} at {}",
            config.ai_engine.model, config.ai_engine.url
        ),
        None => info!("AI classification: disabled, keyword matching only"),
    }

    let store: Arc<dyn ListStore> = Arc::new(store);
    let service = ListService::new(store, CategoryMatcher::with_defaults(), classifier);

    // Start web server
    despensa::web::start_server(config, service).await
}
