use std::sync::Arc;

use opentelemetry::{KeyValue, global, metrics::Counter};

#[derive(Debug)]
pub struct MetricsRegistry {
    pub indexer: Arc<IndexerMetrics>,
    pub apr: Arc<AprMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            indexer: IndexerMetrics::new(),
            apr: AprMetrics::new(),
        })
    }
}

#[derive(Debug)]
pub struct IndexerMetrics {
    events_harvested: Counter<u64>,
    log_queries_failed: Counter<u64>,
}

impl IndexerMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("yieldscope");
        let events_harvested = meter
            .u64_counter("events_harvested_total")
            .with_description("Number of fee events collected from vault logs")
            .with_unit("count")
            .init();

        let log_queries_failed = meter
            .u64_counter("log_queries_failed_total")
            .with_description("Number of vault log queries or log decodes that failed")
            .with_unit("count")
            .init();

        Arc::new(Self {
            events_harvested,
            log_queries_failed,
        })
    }

    pub fn record_events_harvested(&self, chain_id: u64, event_type: &str, count: u64) {
        self.events_harvested.add(
            count,
            &[
                KeyValue::new("chain_id", chain_id.to_string()),
                KeyValue::new("event_type", event_type.to_string()),
            ],
        );
    }

    pub fn record_log_query_failed(&self, chain_id: u64, event_type: &str) {
        self.log_queries_failed.add(
            1,
            &[
                KeyValue::new("chain_id", chain_id.to_string()),
                KeyValue::new("event_type", event_type.to_string()),
            ],
        );
    }
}

#[derive(Debug)]
pub struct AprMetrics {
    oracle_fallbacks: Counter<u64>,
    strategy_apr_failures: Counter<u64>,
}

impl AprMetrics {
    fn new() -> Arc<Self> {
        let meter = global::meter("yieldscope");
        let oracle_fallbacks = meter
            .u64_counter("oracle_fallbacks_total")
            .with_description("Number of times getCurrentApr was used after getStrategyApr")
            .with_unit("count")
            .init();

        let strategy_apr_failures = meter
            .u64_counter("strategy_apr_failures_total")
            .with_description("Number of per-strategy APR reads that failed")
            .with_unit("count")
            .init();

        Arc::new(Self {
            oracle_fallbacks,
            strategy_apr_failures,
        })
    }

    pub fn record_oracle_fallback(&self, chain_id: u64) {
        self.oracle_fallbacks
            .add(1, &[KeyValue::new("chain_id", chain_id.to_string())]);
    }

    pub fn record_strategy_apr_failure(&self, chain_id: u64) {
        self.strategy_apr_failures
            .add(1, &[KeyValue::new("chain_id", chain_id.to_string())]);
    }
}
