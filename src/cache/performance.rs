//! Bounded log of query response times

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPerformanceSample {
    pub query: String,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate view over the retained samples
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub sample_count: usize,
    pub average_response_ms: f64,
    pub max_response_ms: u64,
    pub slow_query_count: usize,
}

/// Ring buffer of samples; the oldest sample is dropped once full
#[derive(Debug)]
pub struct PerformanceLog {
    samples: Mutex<VecDeque<QueryPerformanceSample>>,
    capacity: usize,
    slow_query_ms: u64,
}

impl PerformanceLog {
    pub fn new(capacity: usize, slow_query_ms: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            slow_query_ms,
        }
    }

    pub fn record(&self, query: &str, response_time_ms: u64) {
        let sample = QueryPerformanceSample {
            query: query.to_string(),
            response_time_ms,
            timestamp: Utc::now(),
        };

        let mut samples = self.samples.lock();
        while samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    pub fn stats(&self) -> PerformanceStats {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return PerformanceStats::default();
        }

        let total: u128 = samples.iter().map(|s| u128::from(s.response_time_ms)).sum();
        PerformanceStats {
            sample_count: samples.len(),
            average_response_ms: total as f64 / samples.len() as f64,
            max_response_ms: samples.iter().map(|s| s.response_time_ms).max().unwrap_or(0),
            slow_query_count: samples
                .iter()
                .filter(|s| s.response_time_ms >= self.slow_query_ms)
                .count(),
        }
    }

    /// Most recent samples, newest first
    pub fn recent(&self, n: usize) -> Vec<QueryPerformanceSample> {
        self.samples.lock().iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let log = PerformanceLog::new(10, 100);
        log.record("flat", 20);
        log.record("villa", 40);
        log.record("plot", 150);

        let stats = log.stats();
        assert_eq!(stats.sample_count, 3);
        assert!((stats.average_response_ms - 70.0).abs() < 1e-9);
        assert_eq!(stats.max_response_ms, 150);
        assert_eq!(stats.slow_query_count, 1);
    }

    #[test]
    fn test_huge_response_times_do_not_overflow() {
        let log = PerformanceLog::new(10, 100);
        log.record("a", u64::MAX);
        log.record("b", u64::MAX);

        let stats = log.stats();
        assert_eq!(stats.max_response_ms, u64::MAX);
        assert_eq!(stats.slow_query_count, 2);
        assert!(stats.average_response_ms > 1.0e19);
    }

    #[test]
    fn test_empty_stats() {
        let log = PerformanceLog::new(10, 100);
        assert_eq!(log.stats(), PerformanceStats::default());
        assert!(log.is_empty());
    }

    #[test]
    fn test_oldest_evicted_first() {
        let log = PerformanceLog::new(3, 100);
        for i in 0..5u64 {
            log.record(&format!("q{}", i), i);
        }

        assert_eq!(log.len(), 3);
        let recent: Vec<String> = log.recent(10).into_iter().map(|s| s.query).collect();
        assert_eq!(recent, vec!["q4", "q3", "q2"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let log = PerformanceLog::new(0, 100);
        log.record("a", 1);
        log.record("b", 2);
        assert_eq!(log.len(), 1);
        assert_eq!(log.recent(1)[0].query, "b");
    }
}
