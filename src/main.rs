// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Despensa: Shared Pantry & Shopping List
//!
//! A household pantry tracker with automatic Spanish product categorization
//! using a local keyword engine and optional AI models.
//! Version 1.2 - unified snapshot schema with web API and SQLite store.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use despensa::ai::{OllamaClassifier, OllamaClient};
use despensa::categorize::{CategoryMatcher, Classifier};
use despensa::config::AppConfig;
use despensa::model::{Category, Item, ItemStatus, ListSnapshot, PurchaseReason, Section};
use despensa::service::ListService;
use despensa::store::{ListStore, SqliteStore};
use despensa::{DespensaError, Result};

/// Despensa CLI - Shared Pantry & Shopping List
#[derive(Parser, Debug)]
#[command(name = "despensa")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.2.0")]
#[command(about = "Shared pantry and shopping list with local AI categorization", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a list grouped by category
    Show {
        /// List id (default: configured shared list)
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Add an item, resolving its category automatically
    Add {
        /// Product name
        name: String,

        /// Category label (skips resolution)
        #[arg(long)]
        category: Option<String>,

        /// Initial status
        #[arg(long, value_parser = ["available", "low", "out_of_stock"])]
        status: Option<String>,

        /// Target section
        #[arg(short, long, default_value = "pantry", value_parser = ["pantry", "shopping"])]
        section: String,

        /// List id (default: configured shared list)
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Resolve a name's category without touching any list
    Classify {
        /// Product name
        name: String,

        /// Consult this list's stored overrides
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Re-resolve every catch-all item of a list
    Reclassify {
        /// List id (default: configured shared list)
        #[arg(short, long)]
        list: Option<String>,

        /// Report without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Watch a list and reprint it on every change
    Watch {
        /// List id (default: configured shared list)
        #[arg(short, long)]
        list: Option<String>,
    },

    /// Show AI engine and database status
    Status,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Initialize a new Despensa project
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// Show database statistics
    Stats,

    /// Export all lists to JSON
    Export {
        /// Output file
        output: PathBuf,
    },

    /// Vacuum database (reclaim space)
    Vacuum,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,

    /// Edit configuration interactively
    Edit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if !cli.quiet {
        info!("Despensa v1.2.0 - Shared Pantry & Shopping List");
    }

    // Load configuration
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Show { list }) => run_show(config, list, &cli.format).await,
        Some(Commands::Add { name, category, status, section, list }) => {
            run_add(config, name, category, status, section, list, &cli.format).await
        }
        Some(Commands::Classify { name, list }) => {
            run_classify(config, name, list, &cli.format).await
        }
        Some(Commands::Reclassify { list, dry_run }) => {
            run_reclassify(config, list, dry_run, &cli.format).await
        }
        Some(Commands::Watch { list }) => run_watch(config, list).await,
        Some(Commands::Status) => run_status(config).await,
        Some(Commands::Db { action }) => run_db_command(config, action).await,
        Some(Commands::Config { action }) => {
            run_config_command(config, action, &cli.config).await
        }
        Some(Commands::Init { dir, force }) => run_init(dir, force).await,
        None => {
            // Default: show the shared list
            run_show(config, None, &cli.format).await
        }
    }
}

/// Build the list service from configuration
fn build_service(config: &AppConfig) -> Result<ListService> {
    let store =
        SqliteStore::open(&config.database.path)?.with_backups(config.lists.backup_on_write);
    let store: Arc<dyn ListStore> = Arc::new(store);
    let classifier =
        OllamaClassifier::from_config(config).map(|c| Arc::new(c) as Arc<dyn Classifier>);
    Ok(ListService::new(
        store,
        CategoryMatcher::with_defaults(),
        classifier,
    ))
}

/// Print a snapshot as grouped text
fn print_snapshot(list_id: &str, snapshot: &ListSnapshot) {
    println!("Despensa '{}'", list_id);
    println!("======================");
    println!();

    println!("Pantry ({} items):", snapshot.pantry.len());
    for category in Category::ALL {
        let items: Vec<&Item> = snapshot
            .pantry
            .iter()
            .filter(|i| i.category == category)
            .collect();
        if items.is_empty() {
            continue;
        }
        println!("  {}:", category);
        for item in items {
            let mut flags = vec![item.status.as_str().to_string()];
            if item.is_pending_purchase {
                flags.push("pending".to_string());
            }
            if item.frozen_at.is_some() {
                flags.push("frozen".to_string());
            }
            println!("    - {} [{}]", item.name, flags.join(", "));
        }
    }

    println!();
    println!("Shopping list ({} items):", snapshot.shopping_list.len());
    for item in &snapshot.shopping_list {
        let reason = match item.reason {
            Some(PurchaseReason::Low) => " (running low)",
            Some(PurchaseReason::OutOfStock) => " (out of stock)",
            None => "",
        };
        let later = if item.buy_later { " [later]" } else { "" };
        println!("  - {}{}{}", item.name, reason, later);
    }
}

/// Show a list
async fn run_show(config: AppConfig, list: Option<String>, format: &str) -> Result<()> {
    let list_id = list.unwrap_or_else(|| config.lists.default_list_id.clone());
    let service = build_service(&config)?;
    let snapshot = service.snapshot(&list_id).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        _ => print_snapshot(&list_id, &snapshot),
    }
    Ok(())
}

/// Add an item through the full resolution policy
async fn run_add(
    config: AppConfig,
    name: String,
    category: Option<String>,
    status: Option<String>,
    section: String,
    list: Option<String>,
    format: &str,
) -> Result<()> {
    let list_id = list.unwrap_or_else(|| config.lists.default_list_id.clone());

    let explicit = match &category {
        Some(label) => Some(Category::parse_lenient(label).ok_or_else(|| {
            DespensaError::Config(format!("Unknown category '{}'", label))
        })?),
        None => None,
    };
    let status = status
        .map(|s| s.parse::<ItemStatus>())
        .transpose()
        .map_err(DespensaError::Config)?;
    let section: Section = section.parse().map_err(DespensaError::Config)?;

    let service = build_service(&config)?;
    let added = service
        .add_item(&list_id, &name, explicit, status, section)
        .await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&added)?),
        _ => println!(
            "Added '{}' as {} ({:?})",
            added.item.name, added.item.category, added.resolution.source
        ),
    }
    Ok(())
}

/// Resolve one name's category
async fn run_classify(
    config: AppConfig,
    name: String,
    list: Option<String>,
    format: &str,
) -> Result<()> {
    let service = build_service(&config)?;
    let resolution = service.resolve(list.as_deref(), &name).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&resolution)?),
        _ => println!(
            "{} -> {} ({:?})",
            name, resolution.category, resolution.source
        ),
    }
    Ok(())
}

/// Run the catch-all reclassification sweep
async fn run_reclassify(
    config: AppConfig,
    list: Option<String>,
    dry_run: bool,
    format: &str,
) -> Result<()> {
    let list_id = list.unwrap_or_else(|| config.lists.default_list_id.clone());

    if dry_run {
        warn!("DRY RUN MODE - the list will not be updated");
    }

    let service = build_service(&config)?;
    let summary = service.reclassify(&list_id, !dry_run).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => {
            println!("Reclassified '{}':", list_id);
            println!("  Candidates: {}", summary.candidates);
            println!(
                "  Updated: {} (override {}, local {}, ai {}, fallback {})",
                summary.updated,
                summary.by_source.overrides,
                summary.by_source.local,
                summary.by_source.ai,
                summary.by_source.fallback
            );
            for sample in &summary.samples {
                println!(
                    "    {}: {} -> {} ({:?})",
                    sample.name, sample.from, sample.to, sample.source
                );
            }
        }
    }
    Ok(())
}

/// Watch a list for changes
async fn run_watch(config: AppConfig, list: Option<String>) -> Result<()> {
    let list_id = list.unwrap_or_else(|| config.lists.default_list_id.clone());
    let service = build_service(&config)?;

    let mut last = service.snapshot(&list_id).await?;
    print_snapshot(&list_id, &last);
    println!();
    info!("Watching '{}'. Press Ctrl+C to stop.", list_id);

    // Other processes write the same database file, so poll rather
    // than subscribe.
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Stopped watching.");
                break;
            }
            _ = ticker.tick() => {
                let current = service.snapshot(&list_id).await?;
                if current != last {
                    println!();
                    print_snapshot(&list_id, &current);
                    last = current;
                }
            }
        }
    }
    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    println!("Despensa v1.2.0 Status");
    println!("======================");

    if config.ai_engine.enabled {
        let client = OllamaClient::new(&config.ai_engine);

        match client.health_check().await {
            Ok(()) => println!("AI engine: running"),
            Err(e) => println!("AI engine: error - {}", e),
        }

        match client.list_models().await {
            Ok(models) => {
                println!("\nAvailable models:");
                for m in &models {
                    let marker = if m.starts_with(client.model()) { "→" } else { " " };
                    println!("  {} {}", marker, m);
                }
            }
            Err(e) => println!("  Error listing models: {}", e),
        }
    } else {
        println!("AI engine: disabled (keyword matching only)");
    }

    match SqliteStore::open(&config.database.path) {
        Ok(store) => {
            let stats = store.stats().await?;
            println!("\nDatabase ({}):", config.database.path);
            println!("  Lists: {}", stats.list_count);
            println!("  Products: {}", stats.product_count);
        }
        Err(e) => println!("\nDatabase: error - {}", e),
    }

    println!("\nConfiguration:");
    println!("  Shared list: {}", config.lists.default_list_id);
    println!("  Engine URL: {}", config.ai_engine.url);
    println!("  Model: {}", config.ai_engine.model);
    println!("  Database: {}", config.database.path);

    Ok(())
}

/// Run database commands
async fn run_db_command(config: AppConfig, action: DbCommands) -> Result<()> {
    let store = SqliteStore::open(&config.database.path)?;

    match action {
        DbCommands::Stats => {
            let stats = store.stats().await?;
            println!("Database Statistics:");
            println!("  Lists: {}", stats.list_count);
            println!("  Products: {}", stats.product_count);
        }
        DbCommands::Export { output } => {
            let mut lists = serde_json::Map::new();
            for id in store.list_ids()? {
                if let Some(snapshot) = store.get(&id).await? {
                    lists.insert(id, serde_json::to_value(&snapshot)?);
                }
            }
            let json = serde_json::to_string_pretty(&lists)?;
            std::fs::write(&output, json)?;
            println!("Exported {} lists to {:?}", lists.len(), output);
        }
        DbCommands::Vacuum => {
            store.vacuum()?;
            println!("Database vacuumed successfully");
        }
    }

    Ok(())
}

/// Run config commands
async fn run_config_command(
    config: AppConfig,
    action: ConfigCommands,
    config_path: &Path,
) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            let default_config = AppConfig::default();
            default_config.save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  Shared list: {}", config.lists.default_list_id);
            println!("  Model: {}", config.ai_engine.model);
            println!("  Database: {}", config.database.path);
        }
        ConfigCommands::Edit => {
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            std::process::Command::new(editor)
                .arg(config_path)
                .status()?;
        }
    }

    Ok(())
}

/// Initialize a new Despensa project
async fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("config.json");

    if config_path.exists() && !force {
        return Err(DespensaError::Config(
            "config.json already exists. Use --force to overwrite".to_string(),
        ));
    }

    std::fs::create_dir_all(&target)?;

    let config = AppConfig::default();
    config.save(&config_path)?;

    // Seed the database and the shared list document
    let db_path = target.join(&config.database.path);
    let store: Arc<dyn ListStore> = Arc::new(SqliteStore::open(&db_path)?);
    let service = ListService::new(store, CategoryMatcher::with_defaults(), None);
    service.snapshot(&config.lists.default_list_id).await?;

    println!("Despensa initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - config.json");
    println!("  - {}", config.database.path);
    println!("\nNext steps:");
    println!("  1. Start Ollama (optional): ollama serve");
    println!("  2. Add an item: despensa add \"Tomate frito\"");
    println!("  3. Show the list: despensa show");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["despensa"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_add_command() {
        let cli = Cli::try_parse_from([
            "despensa", "add", "Tomate frito", "--section", "shopping", "--list", "casa",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Add { name, section, list, .. }) => {
                assert_eq!(name, "Tomate frito");
                assert_eq!(section, "shopping");
                assert_eq!(list.as_deref(), Some("casa"));
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_reclassify_command() {
        let cli = Cli::try_parse_from(["despensa", "reclassify", "--dry-run"]).unwrap();

        match cli.command {
            Some(Commands::Reclassify { dry_run, .. }) => assert!(dry_run),
            _ => panic!("Expected Reclassify command"),
        }
    }
}
