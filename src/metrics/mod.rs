//! Per-utterance quality metrics and latency aggregation
//!
//! No reference translation is available at runtime, so confidence and
//! quality are heuristics: the external recognizer's confidence when it
//! reports one, a length/punctuation comparison otherwise.

mod estimator;
mod latency;

pub use estimator::{
    reported_estimate, JitterSource, NoJitter, QualityEstimate, QualityEstimator, RandomJitter,
};
pub use latency::{
    latency_percentiles, percentile, LatencyPercentiles, MetricsAggregator, MetricsSummary,
};
