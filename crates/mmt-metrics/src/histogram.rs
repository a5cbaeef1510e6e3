//! Fixed-bucket histogram for latency tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Default bucket upper bounds, in microseconds (1ms .. 30s)
const DEFAULT_BUCKETS_US: [f64; 10] = [
    1_000.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0, 250_000.0, 500_000.0, 1_000_000.0,
    5_000_000.0, 30_000_000.0,
];

/// Histogram for tracking value distributions
pub struct Histogram {
    /// Inclusive upper bound of each bucket
    bounds: Vec<f64>,
    /// One count per bound, plus a trailing overflow bucket
    counts: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
    max: AtomicU64,
}

impl Histogram {
    /// Create histogram with default latency buckets
    pub fn new() -> Self {
        Self::with_bounds(DEFAULT_BUCKETS_US.to_vec())
    }

    /// Create histogram with custom bucket bounds (sorted ascending)
    pub fn with_bounds(bounds: Vec<f64>) -> Self {
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            counts,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
            max: AtomicU64::new(0),
        }
    }

    /// Record a value; negative values are clamped to zero
    pub fn observe(&self, value: f64) {
        let value = value.max(0.0);
        let whole = value as u64;

        self.sum.fetch_add(whole, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.max.fetch_max(whole, Ordering::Relaxed);

        let index = self
            .bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(self.bounds.len());
        self.counts[index].fetch_add(1, Ordering::Relaxed);
    }

    /// Mean of all observations, 0 when empty
    pub fn mean(&self) -> f64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        self.sum.load(Ordering::Relaxed) as f64 / count as f64
    }

    /// Largest observation
    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// (upper bound, count) per bucket; the overflow bucket reports `f64::INFINITY`
    pub fn buckets(&self) -> Vec<(f64, u64)> {
        self.bounds
            .iter()
            .copied()
            .chain(std::iter::once(f64::INFINITY))
            .zip(self.counts.iter().map(|c| c.load(Ordering::Relaxed)))
            .collect()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
