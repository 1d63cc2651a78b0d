//! Listing search service
//!
//! Per request: probe the cache, on a miss fetch candidates from the store
//! and rank them, publish the ranked list, then record the response time.
//! Retrieval filters and relevance ranking stay separate stages.

use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::cache::{SearchCache, SearchFilters};
use crate::config::{Config, MAX_LIMIT};
use crate::error::{validate_query, AppError};
use crate::listing::{ListingStore, PropertyListing};
use crate::search::{build_dictionary, MatchResult, SearchEngine, SearchOptions};

/// Suggestions per response when the caller gives no limit
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Whether a response was served from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// At most `limit` results, best first
    pub results: Vec<MatchResult<PropertyListing>>,
    /// Number of results above the threshold before the limit was applied
    pub total: usize,
    pub cache_status: CacheStatus,
    pub response_time: Duration,
}

#[derive(Debug, Clone)]
pub struct SuggestOutcome {
    pub suggestions: Vec<String>,
    pub cache_status: CacheStatus,
}

pub struct SearchService {
    store: Arc<dyn ListingStore>,
    cache: Arc<SearchCache<PropertyListing>>,
    engine: SearchEngine,
    options: SearchOptions,
    default_limit: usize,
}

impl SearchService {
    pub fn new(
        store: Arc<dyn ListingStore>,
        cache: Arc<SearchCache<PropertyListing>>,
        engine: SearchEngine,
        options: SearchOptions,
    ) -> Self {
        Self {
            store,
            cache,
            engine,
            options,
            default_limit: 50,
        }
    }

    /// Build the service and its cache from configuration
    pub fn from_config(config: &Config, store: Arc<dyn ListingStore>) -> Result<Self, AppError> {
        config.validate()?;

        let cache = Arc::new(SearchCache::new(config.cache_config()));
        let engine = SearchEngine::with_weights(config.search.weights.clone());
        let service = Self::new(store, cache, engine, config.search_options()?)
            .with_default_limit(config.search.default_limit);

        info!(
            "Search service ready (threshold {}, max results {})",
            config.search.threshold, config.search.max_results
        );
        Ok(service)
    }

    pub fn with_default_limit(mut self, default_limit: usize) -> Self {
        self.default_limit = default_limit.min(MAX_LIMIT);
        self
    }

    pub fn cache(&self) -> &Arc<SearchCache<PropertyListing>> {
        &self.cache
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Ranked listings for a query and filter set
    pub fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: Option<usize>,
    ) -> Result<SearchOutcome, AppError> {
        let started = Instant::now();
        validate_query(query)?;
        let limit = self.resolve_limit(limit, self.default_limit);

        let (ranked, cache_status) = match self.cache.get_cached_search_results(query, filters) {
            Some(ranked) => (ranked, CacheStatus::Hit),
            None => {
                let candidates = self.store.fetch_candidates(filters)?;
                let ranked = self.engine.search_records(query, &candidates, &self.options)?;
                debug!(
                    "Ranked {} of {} candidates for {:?}",
                    ranked.len(),
                    candidates.len(),
                    query
                );
                let ttl = self.cache.config().search_ttl;
                let ranked = self.cache.cache_search_results(query, filters, ranked, ttl);
                (ranked, CacheStatus::Miss)
            }
        };

        let results = ranked.iter().take(limit).cloned().collect();
        let response_time = started.elapsed();
        self.cache
            .record_query_performance(query, millis(response_time));

        Ok(SearchOutcome {
            results,
            total: ranked.len(),
            cache_status,
            response_time,
        })
    }

    /// Completions for a partially typed query
    pub fn suggest(&self, query: &str, limit: Option<usize>) -> Result<SuggestOutcome, AppError> {
        validate_query(query)?;
        let limit = self.resolve_limit(limit, DEFAULT_SUGGESTION_LIMIT);

        let (suggestions, cache_status) = match self.cache.get_cached_suggestions(query) {
            Some(suggestions) => (suggestions, CacheStatus::Hit),
            None => {
                let listings = self.store.all_listings()?;
                let dictionary = build_dictionary(&listings);
                let suggestions: Vec<String> = self
                    .engine
                    .generate_suggestions(query, &dictionary, &self.options)?
                    .into_iter()
                    .map(|s| s.suggestion)
                    .collect();
                (self.cache.cache_suggestions(query, suggestions), CacheStatus::Miss)
            }
        };

        Ok(SuggestOutcome {
            suggestions: suggestions.iter().take(limit).cloned().collect(),
            cache_status,
        })
    }

    fn resolve_limit(&self, limit: Option<usize>, default: usize) -> usize {
        limit.unwrap_or(default).min(MAX_LIMIT)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::fixtures::{listing, sample_listings};
    use crate::listing::InMemoryListingStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store wrapper counting retrievals
    struct CountingStore {
        inner: InMemoryListingStore,
        fetches: AtomicUsize,
    }

    impl ListingStore for CountingStore {
        fn fetch_candidates(&self, filters: &SearchFilters) -> Result<Vec<PropertyListing>, AppError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_candidates(filters)
        }

        fn all_listings(&self) -> Result<Vec<PropertyListing>, AppError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.all_listings()
        }
    }

    struct FailingStore;

    impl ListingStore for FailingStore {
        fn fetch_candidates(&self, _: &SearchFilters) -> Result<Vec<PropertyListing>, AppError> {
            Err(AppError::StoreFailed("backend unavailable".to_string()))
        }

        fn all_listings(&self) -> Result<Vec<PropertyListing>, AppError> {
            Err(AppError::StoreFailed("backend unavailable".to_string()))
        }
    }

    fn counting_service() -> (SearchService, Arc<CountingStore>) {
        counting_service_with(sample_listings())
    }

    fn counting_service_with(listings: Vec<PropertyListing>) -> (SearchService, Arc<CountingStore>) {
        let store = Arc::new(CountingStore {
            inner: InMemoryListingStore::new(listings),
            fetches: AtomicUsize::new(0),
        });
        let service = SearchService::from_config(&Config::default(), store.clone()).unwrap();
        (service, store)
    }

    #[test]
    fn test_search_ranks_and_caches() {
        let (service, store) = counting_service();
        let filters = SearchFilters::new().with("city", "Mumbai");

        let first = service.search("3 BHK flat Mumbai", &filters, None).unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);
        assert_eq!(first.results[0].record.id, "1");
        assert!(first.results.iter().all(|r| r.record.city == "Mumbai"));

        let second = service.search("3 bhk  FLAT mumbai", &filters, None).unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.total, first.total);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);

        let perf = service.cache().performance_stats();
        assert_eq!(perf.sample_count, 2);
    }

    #[test]
    fn test_limit_applies_per_response() {
        let (service, store) = counting_service();
        let filters = SearchFilters::new();

        let full = service.search("mumbai", &filters, None).unwrap();
        assert!(full.total >= 2);

        let one = service.search("mumbai", &filters, Some(1)).unwrap();
        assert_eq!(one.results.len(), 1);
        assert_eq!(one.total, full.total);
        assert_eq!(one.cache_status, CacheStatus::Hit);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filters_are_part_of_the_key() {
        let (service, store) = counting_service();

        service.search("flat", &SearchFilters::new().with("city", "Mumbai"), None).unwrap();
        let pune = service
            .search("flat", &SearchFilters::new().with("city", "Pune"), None)
            .unwrap();
        assert_eq!(pune.cache_status, CacheStatus::Miss);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_differently_filtered_searches_do_not_share_entries() {
        let mut listings = sample_listings();
        listings.push(listing("5", "2 BHK Flat in Vashi", "Vashi", "Navi Mumbai", "Apartment", 9_500_000, 2));
        let (service, store) = counting_service_with(listings);

        let hyphen = service
            .search("flat", &SearchFilters::new().with("city", "Navi-Mumbai"), None)
            .unwrap();
        assert!(hyphen.results.is_empty());
        let spaced = service
            .search("flat", &SearchFilters::new().with("city", "Navi Mumbai"), None)
            .unwrap();
        assert_eq!(spaced.cache_status, CacheStatus::Miss);
        assert_eq!(spaced.results[0].record.id, "5");

        // An unparseable price is ignored by the store, a parseable one is not
        let grouped = service
            .search("flat", &SearchFilters::new().with("max_price", "1,000,000"), None)
            .unwrap();
        assert!(!grouped.results.is_empty());
        let plain = service
            .search("flat", &SearchFilters::new().with("max_price", "1000000"), None)
            .unwrap();
        assert_eq!(plain.cache_status, CacheStatus::Miss);
        assert!(plain.results.is_empty());

        assert_eq!(store.fetches.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_quoted_and_plain_queries_cached_apart() {
        let (service, store) = counting_service();
        let filters = SearchFilters::new();

        let plain = service.search("bhk flat", &filters, None).unwrap();
        let quoted = service.search("\"bhk flat\"", &filters, None).unwrap();
        assert_eq!(quoted.cache_status, CacheStatus::Miss);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);

        assert_eq!(plain.results[0].record.id, "1");
        assert_eq!(quoted.results[0].record.id, "1");
        assert!(quoted.results[0].score > plain.results[0].score);

        let again = service.search("'BHK Flat'", &filters, None).unwrap();
        assert_eq!(again.cache_status, CacheStatus::Hit);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let (service, _) = counting_service();
        let outcome = service.search("   ", &SearchFilters::new(), None).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.total, 0);
    }

    #[test]
    fn test_overlong_query_rejected() {
        let (service, store) = counting_service();
        let query = "a".repeat(501);
        let err = service.search(&query, &SearchFilters::new(), None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_store_failure_propagates() {
        let service = SearchService::from_config(&Config::default(), Arc::new(FailingStore)).unwrap();
        let err = service.search("flat", &SearchFilters::new(), None).unwrap_err();
        assert!(matches!(err, AppError::StoreFailed(_)));
        // Nothing cached on failure
        assert_eq!(service.cache().stats().search_entries, 0);
    }

    #[test]
    fn test_suggest_uses_cache() {
        let (service, store) = counting_service();

        let first = service.suggest("munbai", None).unwrap();
        assert_eq!(first.cache_status, CacheStatus::Miss);
        assert_eq!(first.suggestions.first().map(String::as_str), Some("Mumbai"));
        assert!(!first.suggestions.iter().any(|s| s == "Pune"));

        let second = service.suggest("Munbai", Some(1)).unwrap();
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(second.suggestions, vec!["Mumbai".to_string()]);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_limit_is_capped() {
        let (service, _) = counting_service();
        assert_eq!(service.resolve_limit(Some(10_000), 50), MAX_LIMIT);
        assert_eq!(service.resolve_limit(None, 50), 50);
    }
}
