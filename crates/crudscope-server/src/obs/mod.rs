//! In-process request metrics.
//!
//! Metrics are stored as atomics keyed by label values and rendered by the
//! `/metrics` handler in Prometheus text format.

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;

pub use metrics::{
    CounterVec, HistogramSnapshot, HistogramVec, HttpMetrics, RequestOutcome, DURATION_BUCKETS,
    LAST_DURATION_BUCKETS, SLOW_THRESHOLD,
};
