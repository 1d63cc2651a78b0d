//! Command-line interface
//!
//! Provides the `search`, `suggest` and `serve` commands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::cache::SearchFilters;

/// estate-search CLI
#[derive(Parser, Debug)]
#[command(name = "estate-search")]
#[command(about = "Fuzzy property listing search with a result cache", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to <config dir>/estate-search/config.json)
    #[arg(long, global = true, env = "ESTATE_SEARCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank listings against a query
    Search(SearchArgs),
    /// Suggest completions for a partial query
    Suggest(SuggestArgs),
    /// Run the HTTP search server
    Serve(ServeArgs),
}

/// Search command arguments
#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// JSON file with an array of listings
    #[arg(long)]
    pub listings: PathBuf,

    /// Search terms (case-insensitive, typos tolerated)
    #[arg(short = 'q', long)]
    pub query: String,

    /// Maximum number of results (default 50, max 200)
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Minimum relevance score in [0, 1]
    #[arg(short = 't', long)]
    pub threshold: Option<f64>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Print JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

/// Structured filters applied before ranking
#[derive(Args, Clone, Debug, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub city: Option<String>,

    /// Substring of the listing's location
    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub property_type: Option<String>,

    #[arg(long, alias = "bhk")]
    pub bedrooms: Option<u32>,

    #[arg(long)]
    pub min_price: Option<u64>,

    #[arg(long)]
    pub max_price: Option<u64>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> SearchFilters {
        let mut filters = SearchFilters::new();
        if let Some(city) = &self.city {
            filters.insert("city", city);
        }
        if let Some(location) = &self.location {
            filters.insert("location", location);
        }
        if let Some(property_type) = &self.property_type {
            filters.insert("property_type", property_type);
        }
        if let Some(bedrooms) = self.bedrooms {
            filters.insert("bedrooms", bedrooms);
        }
        if let Some(min_price) = self.min_price {
            filters.insert("min_price", min_price);
        }
        if let Some(max_price) = self.max_price {
            filters.insert("max_price", max_price);
        }
        filters
    }
}

/// Suggest command arguments
#[derive(Args, Clone, Debug)]
pub struct SuggestArgs {
    /// JSON file with an array of listings
    #[arg(long)]
    pub listings: PathBuf,

    /// Partially typed query
    #[arg(short = 'q', long)]
    pub query: String,

    /// Maximum number of suggestions (default 10)
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Print JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

/// Serve command arguments
#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// JSON file with an array of listings
    #[arg(long)]
    pub listings: PathBuf,

    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<String>,
}
