//! Prometheus metrics for the cache policies.
//!
//! Every policy run is timed and labelled with its outcome, so hit ratios and
//! the latency gap between hits and misses can be read per strategy.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

/// Metric names for the cache policies.
pub mod names {
    /// Policy runs answered from the cache.
    pub const CACHE_HITS_TOTAL: &str = "cairn_cache_hits_total";
    /// Policy runs that found no live cache entry.
    pub const CACHE_MISSES_TOTAL: &str = "cairn_cache_misses_total";
    /// Cache entries written after a miss.
    pub const CACHE_POPULATES_TOTAL: &str = "cairn_cache_populates_total";
    /// Cache entries written through after a store write.
    pub const CACHE_WRITES_TOTAL: &str = "cairn_cache_writes_total";
    /// Listing keys dropped after a store write.
    pub const CACHE_INVALIDATIONS_TOTAL: &str = "cairn_cache_invalidations_total";
    /// Policy runs that failed.
    pub const POLICY_ERRORS_TOTAL: &str = "cairn_policy_errors_total";
    /// Backing store round-trips issued by policies.
    pub const STORE_QUERIES_TOTAL: &str = "cairn_store_queries_total";
    /// Policy run duration in seconds.
    pub const POLICY_DURATION_SECONDS: &str = "cairn_policy_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::CACHE_HITS_TOTAL,
        "Total number of policy runs answered from the cache"
    );
    describe_counter!(
        names::CACHE_MISSES_TOTAL,
        "Total number of policy runs that missed the cache"
    );
    describe_counter!(
        names::CACHE_POPULATES_TOTAL,
        "Total number of cache entries populated after a miss"
    );
    describe_counter!(
        names::CACHE_WRITES_TOTAL,
        "Total number of cache entries written through after a store write"
    );
    describe_counter!(
        names::CACHE_INVALIDATIONS_TOTAL,
        "Total number of listing keys invalidated after a store write"
    );
    describe_counter!(
        names::POLICY_ERRORS_TOTAL,
        "Total number of policy runs that failed"
    );
    describe_counter!(
        names::STORE_QUERIES_TOTAL,
        "Total number of backing store queries issued by cache policies"
    );
    describe_histogram!(
        names::POLICY_DURATION_SECONDS,
        Unit::Seconds,
        "Cache policy run duration in seconds"
    );
}

/// How a policy run was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Answered from a live cache entry.
    Hit,
    /// Loaded from the backing store.
    Miss,
    /// Persisted to the backing store.
    Write,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Write => "write",
        }
    }
}

/// Cache policy metrics recorder.
#[derive(Clone)]
pub struct PolicyMetrics;

impl PolicyMetrics {
    /// Record a finished policy run; `None` means it failed.
    pub fn finished(strategy: &'static str, outcome: Option<Outcome>, elapsed: Duration) {
        let label = match outcome {
            Some(Outcome::Hit) => {
                counter!(names::CACHE_HITS_TOTAL, "strategy" => strategy).increment(1);
                Outcome::Hit.as_str()
            }
            Some(Outcome::Miss) => {
                counter!(names::CACHE_MISSES_TOTAL, "strategy" => strategy).increment(1);
                Outcome::Miss.as_str()
            }
            Some(Outcome::Write) => Outcome::Write.as_str(),
            None => {
                counter!(names::POLICY_ERRORS_TOTAL, "strategy" => strategy).increment(1);
                "error"
            }
        };

        histogram!(
            names::POLICY_DURATION_SECONDS,
            "strategy" => strategy,
            "outcome" => label
        )
        .record(elapsed.as_secs_f64());
    }

    /// Record a backing store query.
    pub fn store_query(strategy: &'static str, query: &'static str) {
        counter!(
            names::STORE_QUERIES_TOTAL,
            "strategy" => strategy,
            "query" => query
        )
        .increment(1);
    }

    /// Record a cache entry populated after a miss.
    pub fn populated(strategy: &'static str) {
        counter!(names::CACHE_POPULATES_TOTAL, "strategy" => strategy).increment(1);
    }

    /// Record a write-through cache update.
    pub fn written(strategy: &'static str) {
        counter!(names::CACHE_WRITES_TOTAL, "strategy" => strategy).increment(1);
    }

    /// Record a listing key dropped after a write.
    pub fn invalidated(key: &'static str) {
        counter!(names::CACHE_INVALIDATIONS_TOTAL, "key" => key).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Hit.as_str(), "hit");
        assert_eq!(Outcome::Miss.as_str(), "miss");
        assert_eq!(Outcome::Write.as_str(), "write");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_metrics();
        PolicyMetrics::finished("collection", Some(Outcome::Hit), Duration::from_millis(1));
        PolicyMetrics::finished("collection", None, Duration::from_millis(1));
        PolicyMetrics::store_query("index", "find_by_ids");
    }
}
