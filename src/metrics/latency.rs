use serde::{Deserialize, Serialize};

use crate::pipeline::Metrics;

/// Tail latencies over a sample set, in the samples' unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyPercentiles {
    pub p95: f64,
    pub p99: f64,
}

/// Interpolated percentile of an ascending-sorted slice.
///
/// Uses linear interpolation between the two order statistics bracketing
/// rank `pct/100 * (n - 1)`, so the result moves continuously as samples
/// are added. An empty slice yields 0.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (pct.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// p95 and p99 of `samples` (any order; non-finite values are ignored)
pub fn latency_percentiles(samples: &[f64]) -> LatencyPercentiles {
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|s| s.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    LatencyPercentiles {
        p95: percentile(&sorted, 95.0),
        p99: percentile(&sorted, 99.0),
    }
}

/// Aggregated view of every metric recorded in a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub count: usize,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub avg_confidence: f64,
    pub avg_quality: f64,
}

/// Rolling sample of released-clip metrics.
///
/// Grows for the lifetime of a session; callers wanting a bound can
/// `clear` it.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
    latencies: Vec<f64>,
    confidences: Vec<f64>,
    qualities: Vec<f64>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, metrics: &Metrics) {
        self.latencies.push(metrics.latency_ms);
        self.confidences.push(metrics.confidence);
        self.qualities.push(metrics.quality_estimate);
    }

    pub fn len(&self) -> usize {
        self.latencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latencies.is_empty()
    }

    pub fn clear(&mut self) {
        self.latencies.clear();
        self.confidences.clear();
        self.qualities.clear();
    }

    pub fn summary(&self) -> MetricsSummary {
        let percentiles = latency_percentiles(&self.latencies);
        MetricsSummary {
            count: self.len(),
            p95_latency_ms: percentiles.p95,
            p99_latency_ms: percentiles.p99,
            avg_confidence: mean(&self.confidences),
            avg_quality: mean(&self.qualities),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles_interpolate_top_interval() {
        let p = latency_percentiles(&[100.0, 200.0, 300.0, 400.0]);
        assert!((p.p95 - 385.0).abs() < 1e-9);
        assert!((p.p99 - 397.0).abs() < 1e-9);
        assert!(p.p95 >= 385.0 - 1e-9 && p.p95 <= 400.0);
        assert!(p.p99 >= 385.0 && p.p99 <= 400.0);
    }

    #[test]
    fn test_percentiles_empty_and_single() {
        assert_eq!(latency_percentiles(&[]), LatencyPercentiles { p95: 0.0, p99: 0.0 });
        assert_eq!(
            latency_percentiles(&[42.0]),
            LatencyPercentiles { p95: 42.0, p99: 42.0 }
        );
    }

    #[test]
    fn test_percentiles_ignore_order() {
        let sorted = latency_percentiles(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let shuffled = latency_percentiles(&[4.0, 1.0, 5.0, 3.0, 2.0]);
        assert_eq!(sorted, shuffled);
    }

    #[test]
    fn test_percentile_is_continuous() {
        // Adding one sample never jumps past the new maximum
        let mut samples = vec![10.0, 20.0, 30.0];
        let before = latency_percentiles(&samples).p95;
        samples.push(1000.0);
        let after = latency_percentiles(&samples).p95;
        assert!(after > before);
        assert!(after < 1000.0);
    }

    #[test]
    fn test_aggregator_summary() {
        let mut aggregator = MetricsAggregator::new();
        assert_eq!(aggregator.summary(), MetricsSummary::default());

        for (i, latency) in [100.0, 200.0, 300.0, 400.0].into_iter().enumerate() {
            aggregator.record(&Metrics {
                sequence_id: i as u64,
                language_code: "fr".to_string(),
                latency_ms: latency,
                confidence: 80.0,
                quality_estimate: 60.0,
            });
        }

        let summary = aggregator.summary();
        assert_eq!(summary.count, 4);
        assert!((summary.p95_latency_ms - 385.0).abs() < 1e-9);
        assert_eq!(summary.avg_confidence, 80.0);
        assert_eq!(summary.avg_quality, 60.0);
    }
}
