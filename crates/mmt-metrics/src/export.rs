//! Metrics snapshot and JSON export

use crate::Histogram;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of all metrics at a point in time, keys sorted by name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Counter values
    pub counters: BTreeMap<String, u64>,
    /// Gauge values
    pub gauges: BTreeMap<String, i64>,
    /// Histogram summaries
    pub histograms: BTreeMap<String, HistogramSummary>,
}

/// Summary of a histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    /// Total observation count
    pub count: u64,
    /// Mean value
    pub mean: f64,
    /// Largest value
    pub max: u64,
}

impl From<&Histogram> for HistogramSummary {
    fn from(histogram: &Histogram) -> Self {
        Self {
            count: histogram.count(),
            mean: histogram.mean(),
            max: histogram.max(),
        }
    }
}

impl MetricsSnapshot {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Single-line JSON
    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
