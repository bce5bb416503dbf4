use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Directive engine counters
#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub cycles: AtomicU64,
    pub constructions: AtomicU64,
    pub removals: AtomicU64,
    pub deferred_removals: AtomicU64,
    pub cache_hits: AtomicU64,
    pub nearest_searches: AtomicU64,
    pub oracle_queries: AtomicU64,
    pub incomplete_paths: AtomicU64,
    pub relocation_failures: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_construction(&self) {
        self.constructions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deferred_removal(&self) {
        self.deferred_removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_nearest_search(&self) {
        self.nearest_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_oracle_query(&self) {
        self.oracle_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_incomplete_path(&self) {
        self.incomplete_paths.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relocation_failure(&self) {
        self.relocation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> EngineStats {
        EngineStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            constructions: self.constructions.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            deferred_removals: self.deferred_removals.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            nearest_searches: self.nearest_searches.load(Ordering::Relaxed),
            oracle_queries: self.oracle_queries.load(Ordering::Relaxed),
            incomplete_paths: self.incomplete_paths.load(Ordering::Relaxed),
            relocation_failures: self.relocation_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            cycles = stats.cycles,
            constructions = stats.constructions,
            removals = stats.removals,
            deferred_removals = stats.deferred_removals,
            cache_hits = stats.cache_hits,
            nearest_searches = stats.nearest_searches,
            oracle_queries = stats.oracle_queries,
            incomplete_paths = stats.incomplete_paths,
            relocation_failures = stats.relocation_failures,
            "Directive engine metrics"
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub cycles: u64,
    pub constructions: u64,
    pub removals: u64,
    pub deferred_removals: u64,
    pub cache_hits: u64,
    pub nearest_searches: u64,
    pub oracle_queries: u64,
    pub incomplete_paths: u64,
    pub relocation_failures: u64,
}

/// Global metrics instance
static ENGINE_METRICS: std::sync::LazyLock<EngineMetrics> = std::sync::LazyLock::new(EngineMetrics::new);

pub fn engine_metrics() -> &'static EngineMetrics {
    &ENGINE_METRICS
}

/// Time an operation and log its duration when finished
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
        duration
    }
}
