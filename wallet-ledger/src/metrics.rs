//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `wallet_entries_appended_total` - Ledger entries inserted
//! - `wallet_duplicate_references_total` - Idempotent replays that hit an
//!   existing reference
//! - `wallet_entries_settled_total` - Pending entries finalized
//! - `wallet_append_duration_seconds` - Histogram of append latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Ledger entries inserted
    pub entries_appended: IntCounter,

    /// Replays that hit an existing reference
    pub duplicate_references: IntCounter,

    /// Pending entries finalized
    pub entries_settled: IntCounter,

    /// Append latency histogram
    pub append_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let entries_appended = IntCounter::with_opts(Opts::new(
            "wallet_entries_appended_total",
            "Ledger entries inserted",
        ))?;
        registry.register(Box::new(entries_appended.clone()))?;

        let duplicate_references = IntCounter::with_opts(Opts::new(
            "wallet_duplicate_references_total",
            "Idempotent replays that hit an existing reference",
        ))?;
        registry.register(Box::new(duplicate_references.clone()))?;

        let entries_settled = IntCounter::with_opts(Opts::new(
            "wallet_entries_settled_total",
            "Pending entries finalized",
        ))?;
        registry.register(Box::new(entries_settled.clone()))?;

        let append_duration = Histogram::with_opts(
            HistogramOpts::new(
                "wallet_append_duration_seconds",
                "Histogram of append latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(append_duration.clone()))?;

        Ok(Self {
            entries_appended,
            duplicate_references,
            entries_settled,
            append_duration,
            registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_and_count() {
        let metrics = Metrics::new().unwrap();
        metrics.entries_appended.inc();
        metrics.entries_appended.inc();
        assert_eq!(metrics.entries_appended.get(), 2);

        // Each collector gets its own registry, so a second instance is fine
        let other = Metrics::new().unwrap();
        assert_eq!(other.entries_appended.get(), 0);
    }
}
