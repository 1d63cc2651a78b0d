//! Service configuration stored as JSON in the user's config directory

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::error::AppError;
use crate::search::{FieldWeights, SearchOptions};

/// Upper bound on `limit` for a single response
pub const MAX_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub search: SearchSettings,
    pub cache: CacheSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSettings {
    /// Minimum relevance score for a result or suggestion
    pub threshold: f64,
    /// Length of a ranked list kept in the cache
    pub max_results: usize,
    /// Results per response when the caller gives no limit
    pub default_limit: usize,
    pub weights: FieldWeights,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_results: 100,
            default_limit: 50,
            weights: FieldWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheSettings {
    pub search_ttl_secs: u64,
    pub suggestion_ttl_secs: u64,
    pub max_entries: usize,
    pub performance_sample_capacity: usize,
    pub slow_query_ms: u64,
    /// How often the server purges expired entries
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            search_ttl_secs: 300,
            suggestion_ttl_secs: 120,
            max_entries: 1000,
            performance_sample_capacity: 1000,
            slow_query_ms: 1000,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), AppError> {
        let search = &self.search;
        if !(0.0..=1.0).contains(&search.threshold) {
            return Err(AppError::ConfigError(format!(
                "search.threshold must be within [0, 1], got {}",
                search.threshold
            )));
        }
        if search.max_results == 0 {
            return Err(AppError::ConfigError("search.maxResults must be positive".to_string()));
        }
        if search.default_limit == 0 || search.default_limit > MAX_LIMIT {
            return Err(AppError::ConfigError(format!(
                "search.defaultLimit must be within 1..={}",
                MAX_LIMIT
            )));
        }

        let cache = &self.cache;
        let non_zero = [
            ("cache.searchTtlSecs", cache.search_ttl_secs),
            ("cache.suggestionTtlSecs", cache.suggestion_ttl_secs),
            ("cache.maxEntries", cache.max_entries as u64),
            ("cache.performanceSampleCapacity", cache.performance_sample_capacity as u64),
            ("cache.sweepIntervalSecs", cache.sweep_interval_secs),
        ];
        if let Some((name, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
            return Err(AppError::ConfigError(format!("{} must be positive", name)));
        }

        if self.server.bind.trim().is_empty() {
            return Err(AppError::ConfigError("server.bind must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            search_ttl: Duration::from_secs(self.cache.search_ttl_secs),
            suggestion_ttl: Duration::from_secs(self.cache.suggestion_ttl_secs),
            max_entries: self.cache.max_entries,
            performance_sample_capacity: self.cache.performance_sample_capacity,
            slow_query_ms: self.cache.slow_query_ms,
        }
    }

    pub fn search_options(&self) -> Result<SearchOptions, AppError> {
        Ok(SearchOptions::new(self.search.threshold, self.search.max_results)?)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache.sweep_interval_secs)
    }
}

/// Get the path to the default configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;

    Ok(config_dir.join("estate-search").join("config.json"))
}

/// Load configuration from `path`, or from the default location
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(config)
}

/// Save the configuration as pretty JSON
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let data = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, data).context("Failed to write config file")?;

    Ok(())
}
