//! Named metric registry

use crate::{Histogram, HistogramSummary, MetricsSnapshot};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Thread-safe metrics storage, shared as `Arc<Metrics>`
#[derive(Default)]
pub struct Metrics {
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
    gauges: RwLock<HashMap<String, Arc<AtomicI64>>>,
}

/// Look up `name` under the read lock, inserting under the write lock on a miss
fn get_or_insert<T: Default>(map: &RwLock<HashMap<String, Arc<T>>>, name: &str) -> Arc<T> {
    if let Some(existing) = map.read().get(name) {
        return Arc::clone(existing);
    }
    Arc::clone(map.write().entry(name.to_string()).or_default())
}

impl Metrics {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to a counter
    pub fn counter(&self, name: &str, delta: u64) {
        get_or_insert(&self.counters, name).fetch_add(delta, Ordering::Relaxed);
    }

    /// Add one to a counter
    pub fn increment(&self, name: &str) {
        self.counter(name, 1);
    }

    /// Set a gauge
    pub fn gauge(&self, name: &str, value: i64) {
        get_or_insert(&self.gauges, name).store(value, Ordering::Relaxed);
    }

    /// Record a histogram observation
    pub fn observe(&self, name: &str, value: f64) {
        get_or_insert(&self.histograms, name).observe(value);
    }

    /// Current counter value
    pub fn counter_value(&self, name: &str) -> Option<u64> {
        self.counters
            .read()
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
    }

    /// Current gauge value
    pub fn gauge_value(&self, name: &str) -> Option<i64> {
        self.gauges
            .read()
            .get(name)
            .map(|g| g.load(Ordering::Relaxed))
    }

    /// Histogram mean
    pub fn histogram_mean(&self, name: &str) -> Option<f64> {
        self.histograms.read().get(name).map(|h| h.mean())
    }

    /// Histogram observation count
    pub fn histogram_count(&self, name: &str) -> Option<u64> {
        self.histograms.read().get(name).map(|h| h.count())
    }

    /// Point-in-time copy of every metric
    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self
            .counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();
        let gauges = self
            .gauges
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();
        let histograms = self
            .histograms
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), HistogramSummary::from(v.as_ref())))
            .collect();

        MetricsSnapshot {
            counters,
            gauges,
            histograms,
        }
    }
}
