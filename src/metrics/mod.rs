use lazy_static::lazy_static;
/// Prometheus Metrics
/// Service monitoring and observability
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // === Ingestion Metrics ===

    /// Transactions accepted by the CSV loader
    pub static ref TRANSACTIONS_PARSED: Counter = Counter::new(
        "transactions_parsed_total",
        "Total transactions parsed"
    ).unwrap();

    /// Rows rejected by the CSV loader
    pub static ref PARSE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("parse_errors_total", "Total rejected input rows"),
        &["error_type"]
    ).unwrap();

    // === Analysis Metrics ===

    /// Completed analysis runs
    pub static ref ANALYSES_TOTAL: Counter = Counter::new(
        "analyses_total",
        "Total analysis runs"
    ).unwrap();

    /// End-to-end engine duration
    pub static ref ANALYSIS_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("analysis_duration_seconds", "Analysis engine duration")
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0])
    ).unwrap();

    /// Rings surviving dedup, by pattern
    pub static ref RINGS_DETECTED: CounterVec = CounterVec::new(
        Opts::new("rings_detected_total", "Rings detected by pattern"),
        &["pattern"]
    ).unwrap();
}

/// Initialize metrics registry
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(TRANSACTIONS_PARSED.clone()))
        .ok();
    REGISTRY.register(Box::new(PARSE_ERRORS.clone())).ok();
    REGISTRY.register(Box::new(ANALYSES_TOTAL.clone())).ok();
    REGISTRY.register(Box::new(ANALYSIS_DURATION.clone())).ok();
    REGISTRY.register(Box::new(RINGS_DETECTED.clone())).ok();
}

/// Gather all metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Simple timer for duration metrics
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Timer {
            start: Instant::now(),
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
