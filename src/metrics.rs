//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

use crate::rpc::duration_ms;

/// Per-instance metrics registry
///
/// Each chain access instance owns its registry so several backends (or
/// tests) can live in one process without name collisions.
pub struct Metrics {
    registry: Registry,

    // Counters
    pub operations_total: IntCounterVec,
    pub errors_total: IntCounterVec,
    pub fee_fallback_total: IntCounter,
    pub submissions_confirmed: IntCounter,
    pub submissions_broadcast: IntCounter,
    pub token_accounts_created: IntCounter,

    // Histograms
    pub build_latency: Histogram,
    pub submit_latency: Histogram,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_total = IntCounterVec::new(
            Opts::new("chain_operations_total", "Chain access operations started"),
            &["operation"],
        )?;

        let errors_total = IntCounterVec::new(
            Opts::new("chain_errors_total", "Chain access operations failed, by category"),
            &["category"],
        )?;

        let fee_fallback_total = IntCounter::with_opts(Opts::new(
            "chain_fee_fallback_total",
            "Transactions built with the configured default priority fee",
        ))?;

        let submissions_confirmed = IntCounter::with_opts(Opts::new(
            "chain_submissions_confirmed_total",
            "Submissions confirmed through the subscription channel",
        ))?;

        let submissions_broadcast = IntCounter::with_opts(Opts::new(
            "chain_submissions_broadcast_total",
            "Submissions that fell back to a one-shot broadcast",
        ))?;

        let token_accounts_created = IntCounter::with_opts(Opts::new(
            "chain_token_accounts_created_total",
            "Submitted transactions that create an associated token account",
        ))?;

        let build_latency = Histogram::with_opts(
            HistogramOpts::new("chain_build_latency_seconds", "Transaction build latency")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        )?;

        let submit_latency = Histogram::with_opts(
            HistogramOpts::new("chain_submit_latency_seconds", "Submission latency")
                .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;

        // Register all metrics
        registry.register(Box::new(operations_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(fee_fallback_total.clone()))?;
        registry.register(Box::new(submissions_confirmed.clone()))?;
        registry.register(Box::new(submissions_broadcast.clone()))?;
        registry.register(Box::new(token_accounts_created.clone()))?;
        registry.register(Box::new(build_latency.clone()))?;
        registry.register(Box::new(submit_latency.clone()))?;

        Ok(Self {
            registry,
            operations_total,
            errors_total,
            fee_fallback_total,
            submissions_confirmed,
            submissions_broadcast,
            token_accounts_created,
            build_latency,
            submit_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_operation(&self, operation: &str) {
        self.operations_total.with_label_values(&[operation]).inc();
    }

    pub fn record_error(&self, category: &str) {
        self.errors_total.with_label_values(&[category]).inc();
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn elapsed_ms(&self) -> u64 {
        duration_ms(self.start.elapsed())
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
