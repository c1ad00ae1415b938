//! Latency histogram and the concurrent metrics aggregator.
mod aggregator;
mod histogram;

#[cfg(test)]
mod tests;

pub use aggregator::MetricsAggregator;
pub use histogram::{HISTOGRAM_BUCKETS, LatencyHistogram, bucket_index, bucket_lower_bound_ms};
