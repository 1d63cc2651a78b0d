//! In-process search cache
//!
//! Holds ranked search results and suggestion lists for a limited time and
//! keeps a bounded log of query response times. The cache never fetches
//! anything itself: callers probe it, recompute on a miss and store the
//! result. An expired entry is indistinguishable from a missing one.

pub mod key;
pub mod performance;

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::search::MatchResult;

pub use key::{CacheKey, SearchFilters};
pub use performance::{PerformanceLog, PerformanceStats, QueryPerformanceSample};

/// Lifetimes and bounds of a [`SearchCache`]
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Default lifetime of a search result list
    pub search_ttl: Duration,
    /// Lifetime of a suggestion list
    pub suggestion_ttl: Duration,
    /// Maximum entries per map (results and suggestions are bounded separately)
    pub max_entries: usize,
    /// Number of response-time samples kept
    pub performance_sample_capacity: usize,
    /// Response time at which a query counts as slow
    pub slow_query_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl: Duration::from_secs(5 * 60),
            suggestion_ttl: Duration::from_secs(2 * 60),
            max_entries: 1000,
            performance_sample_capacity: 1000,
            slow_query_ms: 1000,
        }
    }
}

/// A cached value with its creation time and lifetime
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub key: CacheKey,
    pub value: T,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(key: CacheKey, value: T, ttl: Duration) -> Self {
        Self {
            key,
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Valid while `now - created_at < ttl`
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < self.ttl
    }
}

/// Entry counts and hit/miss counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub search_entries: usize,
    pub suggestion_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

type Results<R> = Arc<Vec<MatchResult<R>>>;

/// TTL cache for search results and suggestions
pub struct SearchCache<R> {
    config: CacheConfig,
    results: DashMap<CacheKey, CacheEntry<Results<R>>>,
    suggestions: DashMap<CacheKey, CacheEntry<Arc<Vec<String>>>>,
    performance: PerformanceLog,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<R> SearchCache<R> {
    pub fn new(config: CacheConfig) -> Self {
        let performance =
            PerformanceLog::new(config.performance_sample_capacity, config.slow_query_ms);
        Self {
            config,
            results: DashMap::new(),
            suggestions: DashMap::new(),
            performance,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cached results for a query and filter set, if still fresh
    pub fn get_cached_search_results(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Option<Results<R>> {
        let key = CacheKey::for_search(query, filters);
        self.lookup(&self.results, &key)
    }

    /// Store results under the canonical key; replaces any previous entry
    ///
    /// Returns the shared list that was published.
    pub fn cache_search_results(
        &self,
        query: &str,
        filters: &SearchFilters,
        results: Vec<MatchResult<R>>,
        ttl: Duration,
    ) -> Results<R> {
        let key = CacheKey::for_search(query, filters);
        let results = Arc::new(results);
        self.store(&self.results, key, Arc::clone(&results), ttl);
        results
    }

    /// Cached suggestions for a query, if still fresh
    pub fn get_cached_suggestions(&self, query: &str) -> Option<Arc<Vec<String>>> {
        let key = CacheKey::for_suggestions(query);
        self.lookup(&self.suggestions, &key)
    }

    /// Store suggestions with the configured suggestion lifetime
    pub fn cache_suggestions(&self, query: &str, suggestions: Vec<String>) -> Arc<Vec<String>> {
        let key = CacheKey::for_suggestions(query);
        let ttl = self.config.suggestion_ttl;
        let suggestions = Arc::new(suggestions);
        self.store(&self.suggestions, key, Arc::clone(&suggestions), ttl);
        suggestions
    }

    pub fn record_query_performance(&self, query: &str, response_time_ms: u64) {
        self.performance.record(query, response_time_ms);
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.performance.stats()
    }

    /// Most recent samples, newest first
    pub fn recent_samples(&self, n: usize) -> Vec<QueryPerformanceSample> {
        self.performance.recent(n)
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.results.len() + self.suggestions.len();

        self.results.retain(|_, entry| entry.is_fresh(now));
        self.suggestions.retain(|_, entry| entry.is_fresh(now));

        let removed = before.saturating_sub(self.results.len() + self.suggestions.len());
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Remove all entries and samples, reset counters
    pub fn clear(&self) {
        self.results.clear();
        self.suggestions.clear();
        self.performance.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            search_entries: self.results.len(),
            suggestion_entries: self.suggestions.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lookup<T: Clone>(&self, map: &DashMap<CacheKey, CacheEntry<T>>, key: &CacheKey) -> Option<T> {
        let now = Instant::now();
        let fresh = map.get(key).and_then(|guard| {
            let entry = guard.value();
            entry.is_fresh(now).then(|| entry.value.clone())
        });

        match fresh {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key.as_str(), "cache hit");
                Some(value)
            }
            None => {
                // Only drop the entry if it is still the stale one
                map.remove_if(key, |_, entry| !entry.is_fresh(now));
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = key.as_str(), "cache miss");
                None
            }
        }
    }

    /// Insert, then trim back to `max_entries`
    ///
    /// Concurrent writers can overshoot the bound between their insert and
    /// their trim, but every writer trims after inserting.
    fn store<T>(&self, map: &DashMap<CacheKey, CacheEntry<T>>, key: CacheKey, value: T, ttl: Duration) {
        map.insert(key.clone(), CacheEntry::new(key.clone(), value, ttl));
        if map.len() > self.config.max_entries {
            self.make_room(map, &key);
        }
    }

    /// Drop expired entries, then the oldest ones other than `keep`
    fn make_room<T>(&self, map: &DashMap<CacheKey, CacheEntry<T>>, keep: &CacheKey) {
        let now = Instant::now();
        map.retain(|_, entry| entry.is_fresh(now));

        while map.len() > self.config.max_entries {
            let oldest = map
                .iter()
                .filter(|guard| guard.key() != keep)
                .min_by_key(|guard| guard.value().created_at)
                .map(|guard| guard.key().clone());

            let Some(key) = oldest else { break };
            map.remove(&key);
            warn!(
                key = key.as_str(),
                max_entries = self.config.max_entries,
                "cache full, evicted oldest entry"
            );
        }
    }
}

impl<R> Default for SearchCache<R> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchField;
    use std::thread::sleep;

    fn result(title: &str, score: f64) -> MatchResult<String> {
        MatchResult {
            record: title.to_string(),
            score,
            matched_fields: vec![SearchField::Title],
        }
    }

    #[test]
    fn test_ttl_expiry() {
        let cache: SearchCache<String> = SearchCache::default();
        let filters = SearchFilters::new().with("city", "Mumbai");
        let results = vec![result("3 BHK Flat", 0.9)];

        cache.cache_search_results("flat", &filters, results.clone(), Duration::from_millis(100));
        let cached = cache.get_cached_search_results("flat", &filters).unwrap();
        assert_eq!(*cached, results);

        sleep(Duration::from_millis(150));
        assert!(cache.get_cached_search_results("flat", &filters).is_none());
        // Lazily removed on the failed read
        assert_eq!(cache.stats().search_entries, 0);
    }

    #[test]
    fn test_filter_order_hits_same_entry() {
        let cache: SearchCache<String> = SearchCache::default();
        let a = SearchFilters::new().with("bhk", 2).with("city", "Mumbai");
        let b = SearchFilters::new().with("city", "Mumbai").with("bhk", 2);

        cache.cache_search_results("flat", &a, vec![result("x", 0.5)], Duration::from_secs(60));
        assert!(cache.get_cached_search_results("flat", &b).is_some());
        assert!(cache.get_cached_search_results("FLAT ", &b).is_some());
        assert!(cache.get_cached_search_results("villa", &b).is_none());
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let cache: SearchCache<String> = SearchCache::default();
        let filters = SearchFilters::new();

        let ttl = Duration::from_millis(200);

        cache.cache_search_results("flat", &filters, vec![result("old", 0.5)], ttl);
        sleep(Duration::from_millis(120));
        cache.cache_search_results("flat", &filters, vec![result("new", 0.6)], ttl);
        sleep(Duration::from_millis(120));

        let cached = cache.get_cached_search_results("flat", &filters).unwrap();
        assert_eq!(cached[0].record, "new");
    }

    #[test]
    fn test_suggestions_roundtrip() {
        let cache: SearchCache<String> = SearchCache::default();
        assert!(cache.get_cached_suggestions("mum").is_none());

        cache.cache_suggestions("Mum", vec!["Mumbai".to_string(), "Mumbai Central".to_string()]);
        let cached = cache.get_cached_suggestions("mum").unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn test_suggestions_use_their_own_ttl() {
        let config = CacheConfig {
            suggestion_ttl: Duration::from_millis(50),
            ..CacheConfig::default()
        };
        let cache: SearchCache<String> = SearchCache::new(config);

        cache.cache_suggestions("pune", vec!["Pune".to_string()]);
        sleep(Duration::from_millis(80));
        assert!(cache.get_cached_suggestions("pune").is_none());
    }

    #[test]
    fn test_hit_miss_counters() {
        let cache: SearchCache<String> = SearchCache::default();
        let filters = SearchFilters::new();

        assert!(cache.get_cached_search_results("flat", &filters).is_none());
        cache.cache_search_results("flat", &filters, vec![], Duration::from_secs(60));
        assert!(cache.get_cached_search_results("flat", &filters).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.search_entries, 1);
    }

    #[test]
    fn test_purge_expired() {
        let cache: SearchCache<String> = SearchCache::default();
        let filters = SearchFilters::new();

        cache.cache_search_results("a", &filters, vec![], Duration::from_millis(10));
        cache.cache_search_results("b", &filters, vec![], Duration::from_secs(60));
        sleep(Duration::from_millis(30));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().search_entries, 1);
        assert!(cache.get_cached_search_results("b", &filters).is_some());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let config = CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        };
        let cache: SearchCache<String> = SearchCache::new(config);
        let filters = SearchFilters::new();
        let ttl = Duration::from_secs(60);

        cache.cache_search_results("first", &filters, vec![], ttl);
        sleep(Duration::from_millis(2));
        cache.cache_search_results("second", &filters, vec![], ttl);
        sleep(Duration::from_millis(2));
        cache.cache_search_results("third", &filters, vec![], ttl);

        assert_eq!(cache.stats().search_entries, 2);
        assert!(cache.get_cached_search_results("first", &filters).is_none());
        assert!(cache.get_cached_search_results("second", &filters).is_some());
        assert!(cache.get_cached_search_results("third", &filters).is_some());
    }

    #[test]
    fn test_capacity_holds_under_concurrent_writers() {
        let config = CacheConfig {
            max_entries: 4,
            ..CacheConfig::default()
        };
        let cache: Arc<SearchCache<String>> = Arc::new(SearchCache::new(config));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let filters = SearchFilters::new();
                    for j in 0..50 {
                        let query = format!("query {} {}", i, j);
                        cache.cache_search_results(&query, &filters, vec![], Duration::from_secs(60));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.stats().search_entries <= 4);
        assert!(cache.stats().search_entries > 0);
    }

    #[test]
    fn test_performance_samples_bounded() {
        let config = CacheConfig {
            performance_sample_capacity: 5,
            ..CacheConfig::default()
        };
        let cache: SearchCache<String> = SearchCache::new(config);

        for i in 0..20 {
            cache.record_query_performance("flat", i);
        }

        let stats = cache.performance_stats();
        assert_eq!(stats.sample_count, 5);
        assert_eq!(stats.max_response_ms, 19);
        assert_eq!(cache.recent_samples(1)[0].response_time_ms, 19);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache: Arc<SearchCache<String>> = Arc::new(SearchCache::default());
        let filters = SearchFilters::new();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let filters = filters.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let title = format!("{}-{}", i, j);
                        cache.cache_search_results(
                            "flat",
                            &filters,
                            vec![result(&title, 0.5), result(&title, 0.4)],
                            Duration::from_secs(60),
                        );
                        if let Some(cached) = cache.get_cached_search_results("flat", &filters) {
                            // Entries are published whole
                            assert_eq!(cached.len(), 2);
                            assert_eq!(cached[0].record, cached[1].record);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.stats().search_entries, 1);
    }

    #[test]
    fn test_clear() {
        let cache: SearchCache<String> = SearchCache::default();
        cache.cache_suggestions("pune", vec!["Pune".to_string()]);
        cache.record_query_performance("pune", 3);
        cache.clear();

        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.performance_stats().sample_count, 0);
    }
}
