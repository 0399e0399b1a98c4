//! Routing metrics collection

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Well-known metric names
pub mod names {
    pub const EVALUATIONS: &str = "routing.evaluations";
    pub const MATCHES: &str = "routing.matches";
    pub const NO_MATCH: &str = "routing.no_match";
    pub const CACHE_HITS: &str = "routing.cache_hits";
    pub const RULE_ERRORS: &str = "routing.rule_errors";
    pub const EVALUATION_LATENCY: &str = "routing.evaluation_latency";
}

/// Monotonic counter
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Samples kept per histogram for percentiles
pub const DEFAULT_SAMPLE_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct HistogramState {
    /// Most recent samples, oldest first
    samples: VecDeque<f64>,
    count: u64,
    sum: f64,
}

/// Histogram of observed values, kept in milliseconds for latencies.
///
/// Count, sum and average cover every observation. Percentiles are taken
/// over the most recent `capacity` samples.
#[derive(Debug)]
pub struct Histogram {
    state: RwLock<HistogramState>,
    capacity: usize,
}

impl Histogram {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SAMPLE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: RwLock::new(HistogramState {
                samples: VecDeque::with_capacity(capacity),
                count: 0,
                sum: 0.0,
            }),
            capacity,
        }
    }

    pub fn observe(&self, value: f64) {
        let mut state = self.state.write();
        if state.samples.len() == self.capacity {
            state.samples.pop_front();
        }
        state.samples.push_back(value);
        state.count += 1;
        state.sum += value;
    }

    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64() * 1000.0);
    }

    pub fn count(&self) -> u64 {
        self.state.read().count
    }

    /// Number of samples currently retained for percentiles
    pub fn retained(&self) -> usize {
        self.state.read().samples.len()
    }

    pub fn sum(&self) -> f64 {
        self.state.read().sum
    }

    pub fn avg(&self) -> f64 {
        let state = self.state.read();
        if state.count == 0 {
            0.0
        } else {
            state.sum / state.count as f64
        }
    }

    /// Nearest-rank percentile over the retained samples, `p` in 0..=100
    pub fn percentile(&self, p: f64) -> f64 {
        let mut values: Vec<f64> = self.state.read().samples.iter().copied().collect();
        if values.is_empty() {
            return 0.0;
        }

        values.sort_by(|a, b| a.total_cmp(b));
        let index = ((p.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64).round() as usize;
        values[index]
    }

    pub fn reset(&self) {
        let mut state = self.state.write();
        state.samples.clear();
        state.count = 0;
        state.sum = 0.0;
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of all metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    /// Latency summaries: count, avg, p50, p95, p99
    pub histograms: BTreeMap<String, BTreeMap<String, f64>>,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }
}

/// Registry of named counters and histograms
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create a counter
    pub fn counter(&self, name: &str) -> Arc<Counter> {
        if let Some(counter) = self.counters.read().get(name) {
            return counter.clone();
        }
        self.counters
            .write()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Get or create a histogram
    pub fn histogram(&self, name: &str) -> Arc<Histogram> {
        if let Some(histogram) = self.histograms.read().get(name) {
            return histogram.clone();
        }
        self.histograms
            .write()
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// Record one routing evaluation
    pub fn record_evaluation(&self, matched: bool, cache_hit: bool, rule_errors: usize, latency: Duration) {
        self.counter(names::EVALUATIONS).inc();
        if matched {
            self.counter(names::MATCHES).inc();
        } else {
            self.counter(names::NO_MATCH).inc();
        }
        if cache_hit {
            self.counter(names::CACHE_HITS).inc();
        }
        if rule_errors > 0 {
            self.counter(names::RULE_ERRORS).add(rule_errors as u64);
        }
        self.histogram(names::EVALUATION_LATENCY).observe_duration(latency);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .read()
            .iter()
            .map(|(name, counter)| (name.clone(), counter.get()))
            .collect();

        let histograms = self
            .histograms
            .read()
            .iter()
            .map(|(name, histogram)| {
                let summary = BTreeMap::from([
                    ("count".to_string(), histogram.count() as f64),
                    ("avg".to_string(), histogram.avg()),
                    ("p50".to_string(), histogram.percentile(50.0)),
                    ("p95".to_string(), histogram.percentile(95.0)),
                    ("p99".to_string(), histogram.percentile(99.0)),
                ]);
                (name.clone(), summary)
            })
            .collect();

        MetricsSnapshot { counters, histograms }
    }

    pub fn reset_all(&self) {
        for counter in self.counters.read().values() {
            counter.reset();
        }
        for histogram in self.histograms.read().values() {
            histogram.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        assert_eq!(counter.get(), 0);
        counter.inc();
        counter.add(5);
        assert_eq!(counter.get(), 6);
        counter.reset();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_histogram_percentile() {
        let histogram = Histogram::new();
        for i in 1..=100 {
            histogram.observe(i as f64);
        }
        assert_eq!(histogram.count(), 100);
        assert!((histogram.percentile(50.0) - 50.5).abs() < 2.0);
        assert!((histogram.percentile(95.0) - 95.0).abs() < 2.0);
        assert_eq!(Histogram::new().percentile(50.0), 0.0);
    }

    #[test]
    fn test_histogram_retains_bounded_window() {
        let histogram = Histogram::with_capacity(100);
        for i in 1..=10_000 {
            histogram.observe(i as f64);
        }
        assert_eq!(histogram.retained(), 100);
        assert_eq!(histogram.count(), 10_000);
        assert!((histogram.avg() - 5000.5).abs() < 1e-9);
        // Percentiles only see the last 100 samples
        assert_eq!(histogram.percentile(0.0), 9901.0);
        assert_eq!(histogram.percentile(100.0), 10_000.0);
    }

    #[test]
    fn test_record_evaluation() {
        let collector = MetricsCollector::new();
        collector.record_evaluation(true, false, 0, Duration::from_millis(2));
        collector.record_evaluation(false, true, 2, Duration::from_millis(4));

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.counter(names::EVALUATIONS), 2);
        assert_eq!(snapshot.counter(names::MATCHES), 1);
        assert_eq!(snapshot.counter(names::NO_MATCH), 1);
        assert_eq!(snapshot.counter(names::CACHE_HITS), 1);
        assert_eq!(snapshot.counter(names::RULE_ERRORS), 2);

        let latency = &snapshot.histograms[names::EVALUATION_LATENCY];
        assert_eq!(latency["count"], 2.0);
        assert!((latency["avg"] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_all() {
        let collector = MetricsCollector::new();
        collector.counter("c1").inc();
        collector.histogram("h1").observe(10.0);
        collector.reset_all();
        assert_eq!(collector.counter("c1").get(), 0);
        assert_eq!(collector.histogram("h1").count(), 0);
        assert_eq!(collector.histogram("h1").retained(), 0);
    }
}
