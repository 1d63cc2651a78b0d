//! estate-search CLI & HTTP server
//!
//! - `search`: rank listings from a JSON file against a query
//! - `suggest`: complete a partially typed query
//! - `serve`: expose both over HTTP with a shared result cache

use anyhow::{Context, Result};
use clap::Parser;
use estate_search::cli::{Cli, Commands, SearchArgs, ServeArgs, SuggestArgs};
use estate_search::config::{load_config, Config};
use estate_search::error::AppError;
use estate_search::format::{format_search_results, format_suggestions};
use estate_search::listing::InMemoryListingStore;
use estate_search::server;
use estate_search::service::SearchService;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags; RUST_LOG wins when set
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let result = run(cli).await;

    match result {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> Result<Option<String>> {
    let config = load_config(cli.config.as_deref())
        .map_err(|e| AppError::ConfigError(format!("{:#}", e)))?;

    match cli.command {
        Commands::Search(args) => execute_search_cli(config, args).map(Some),
        Commands::Suggest(args) => execute_suggest_cli(config, args).map(Some),
        Commands::Serve(args) => execute_serve(config, args).await.map(|_| None),
    }
}

fn build_service(config: &Config, listings: &Path) -> Result<SearchService> {
    let store = InMemoryListingStore::from_json_file(listings)?;
    Ok(SearchService::from_config(config, Arc::new(store))?)
}

/// Execute search command in CLI mode
fn execute_search_cli(mut config: Config, args: SearchArgs) -> Result<String> {
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::InvalidInput(format!(
                "threshold must be within [0, 1], got {}",
                threshold
            ))
            .into());
        }
        config.search.threshold = threshold;
    }
    let service = build_service(&config, &args.listings)?;

    let filters = args.filters.to_filters();
    let outcome = service.search(&args.query, &filters, args.limit)?;
    info!(
        "{} of {} results in {:?}",
        outcome.results.len(),
        outcome.total,
        outcome.response_time
    );

    if args.json {
        serde_json::to_string_pretty(&outcome.results).context("Failed to serialize results")
    } else {
        Ok(format_search_results(&outcome, &args.query))
    }
}

/// Execute suggest command in CLI mode
fn execute_suggest_cli(config: Config, args: SuggestArgs) -> Result<String> {
    let service = build_service(&config, &args.listings)?;
    let outcome = service.suggest(&args.query, args.limit)?;

    if args.json {
        serde_json::to_string_pretty(&outcome.suggestions).context("Failed to serialize suggestions")
    } else {
        Ok(format_suggestions(&args.query, &outcome.suggestions))
    }
}

/// Run the HTTP server until interrupted
async fn execute_serve(config: Config, args: ServeArgs) -> Result<()> {
    let service = Arc::new(build_service(&config, &args.listings)?);
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    info!("Starting estate-search server");
    server::serve(service, &bind, config.sweep_interval()).await
}

/// Map errors to exit codes: 1 invalid input, 3 not found, 4 store/config, 5 other
fn get_exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<AppError>()
        .map(AppError::exit_code)
        .unwrap_or(5)
}
