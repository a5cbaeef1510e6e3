//! # mmt-metrics
//!
//! Lightweight in-process metrics for the translation scheduler and
//! decoder pool.
//!
//! Features:
//! - Counters (admitted / rejected jobs, failed splits)
//! - Gauges (queue depth)
//! - Histograms (queue wait, decode time)
//! - JSON snapshot export

#![warn(missing_docs)]
#![warn(clippy::all)]

mod export;
mod histogram;
mod registry;

pub use export::{HistogramSummary, MetricsSnapshot};
pub use histogram::Histogram;
pub use registry::Metrics;

/// Time a block and record the elapsed microseconds into a histogram
#[macro_export]
macro_rules! timed {
    ($metrics:expr, $name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        $metrics.observe($name, start.elapsed().as_micros() as f64);
        result
    }};
}
